//! Progress reporting for a scan
//!
//! The coordinator calls into a [`ScanProgress`] passed in by the caller; the
//! aggregator is the only caller, so implementations see calls from one thread
//! at a time.

use indicatif::{ProgressBar, ProgressStyle};

use crate::results::{FileOutcome, ScanOutput};

/// Receives one tick per completed workbook
pub trait ScanProgress {
    /// Called once before any file is dispatched
    fn begin(&self, total_files: usize);

    /// Called after each workbook completes, whether it matched, missed or failed
    fn file_finished(&self, outcome: &FileOutcome);

    /// Called once after the last outcome has been merged
    fn finish(&self, output: &ScanOutput);
}

/// Terminal progress bar
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self { bar }
    }

    /// A bar that draws nothing, for tests and non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanProgress for BarProgress {
    fn begin(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.set_position(0);
    }

    fn file_finished(&self, outcome: &FileOutcome) {
        let matched = outcome.match_count();
        if matched > 0 {
            self.bar.set_message(format!("(+{} rows)", matched));
        }
        self.bar.inc(1);
    }

    fn finish(&self, output: &ScanOutput) {
        self.bar.finish_with_message(format!(
            "{} matching rows",
            output.total_matches()
        ));
    }
}

/// Discards every tick
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ScanProgress for SilentProgress {
    fn begin(&self, _total_files: usize) {}

    fn file_finished(&self, _outcome: &FileOutcome) {}

    fn finish(&self, _output: &ScanOutput) {}
}
