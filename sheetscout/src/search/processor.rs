use std::panic::{self, AssertUnwindSafe};
use tracing::{trace, warn};

use super::matcher::RowMatcher;
use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanMetrics;
use crate::results::{FileMatches, FileOutcome};
use crate::sheet::{SheetFile, SheetReader};

/// Runs the per-file unit of work: open, read every row, keep the matches.
///
/// Whatever goes wrong inside one workbook ends here as [`FileOutcome::Failed`];
/// the caller never sees an `Err` or an unwinding panic from [`process`].
///
/// [`process`]: FileProcessor::process
#[derive(Debug, Clone)]
pub struct FileProcessor<'k> {
    matcher: RowMatcher<'k>,
    metrics: ScanMetrics,
}

impl<'k> FileProcessor<'k> {
    pub fn new(matcher: RowMatcher<'k>, metrics: ScanMetrics) -> Self {
        Self { matcher, metrics }
    }

    /// Gets the shared scan metrics
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Scans one workbook, converting errors and panics into a failed outcome
    pub fn process(&self, file: &SheetFile) -> FileOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.scan_file(file)))
            .unwrap_or_else(|payload| Err(ScanError::read(&file.path, panic_message(&*payload))));

        match result {
            Ok(matches) => {
                self.metrics.record_file(file.format);
                FileOutcome::Scanned(matches)
            }
            Err(error) => {
                warn!("Skipping {}: {}", file.path.display(), error);
                self.metrics.record_failure();
                FileOutcome::Failed {
                    path: file.path.clone(),
                    error,
                }
            }
        }
    }

    fn scan_file(&self, file: &SheetFile) -> ScanResult<FileMatches> {
        trace!("Scanning {}", file.path.display());

        let mut reader = SheetReader::open(&file.path, file.format)?;
        let mut matches = FileMatches {
            path: file.path.clone(),
            ..Default::default()
        };

        reader.for_each_row(|row| {
            matches.rows_scanned += 1;
            let record = self.matcher.match_row(&file.file_name, &row);
            self.metrics.record_row(row.len(), record.is_some());
            if let Some(record) = record {
                matches.records.push(record);
            }
        })?;

        trace!(
            "{}: {} rows, {} matches",
            file.path.display(),
            matches.rows_scanned,
            matches.records.len()
        );
        Ok(matches)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("reader panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("reader panicked: {}", msg)
    } else {
        "reader panicked".to_string()
    }
}
