use crossbeam_channel::unbounded;
use ignore::WalkBuilder;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::matcher::RowMatcher;
use super::processor::FileProcessor;
use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};
use crate::filters::is_candidate;
use crate::keywords::KeywordSet;
use crate::metrics::ScanMetrics;
use crate::progress::ScanProgress;
use crate::results::{FileFailure, FileOutcome, ScanOutput};
use crate::sheet::{ResultWriter, SheetFile};

/// What a finished run reports back to the caller
#[derive(Debug, Clone)]
pub struct SearchSummary {
    pub keywords: usize,
    pub files_discovered: usize,
    pub files_scanned: usize,
    pub files_with_matches: usize,
    pub rows_scanned: usize,
    pub total_matches: usize,
    pub failures: Vec<FileFailure>,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

impl SearchSummary {
    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Collects every `.xlsx`/`.xls` file below `root`.
///
/// Hidden files and ignore files are not honoured; every workbook counts.
pub fn discover_files(root: &Path) -> ScanResult<Vec<SheetFile>> {
    if !root.is_dir() {
        return Err(ScanError::search_root_not_found(root));
    }

    let walker = WalkBuilder::new(root).standard_filters(false).build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || !is_candidate(entry.path()) {
            continue;
        }
        if let Some(file) = SheetFile::from_path(entry.into_path()) {
            files.push(file);
        }
    }

    debug!("Found {} workbooks under {}", files.len(), root.display());
    Ok(files)
}

/// Scans `files` on a pool of `threads` workers.
///
/// Workers pull one file at a time from a shared queue and hand each outcome to
/// the calling thread, which is the only writer of the returned [`ScanOutput`].
/// Row order within a file is preserved; files appear in completion order.
pub fn scan_files(
    files: &[SheetFile],
    keywords: &KeywordSet,
    threads: NonZeroUsize,
    progress: &dyn ScanProgress,
) -> ScanResult<ScanOutput> {
    let mut output = ScanOutput::new();
    progress.begin(files.len());

    if files.is_empty() {
        debug!("No workbooks to scan");
        progress.finish(&output);
        return Ok(output);
    }

    let workers = threads.get().min(files.len());
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("sheetscout-worker-{}", i))
        .build()
        .map_err(ScanError::worker_pool)?;
    debug!("Scanning {} workbooks on {} workers", files.len(), workers);

    let processor = FileProcessor::new(RowMatcher::new(keywords), ScanMetrics::new());

    let (work_tx, work_rx) = unbounded::<&SheetFile>();
    for file in files {
        work_tx.send(file).map_err(ScanError::worker_pool)?;
    }
    drop(work_tx);

    let (done_tx, done_rx) = unbounded::<FileOutcome>();

    pool.in_place_scope(|scope| {
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            let processor = processor.clone();
            scope.spawn(move |_| {
                while let Ok(file) = work_rx.recv() {
                    if done_tx.send(processor.process(file)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(done_tx);

        for outcome in done_rx.iter() {
            progress.file_finished(&outcome);
            output.add_outcome(outcome);
        }
    });

    processor.metrics().log_stats();
    progress.finish(&output);
    Ok(output)
}

/// Runs the whole pipeline: keywords, discovery, scan, result workbook.
///
/// Only failures inside individual workbooks are tolerated; everything else
/// aborts before the output file is touched.
pub fn run_search(config: &ScanConfig, progress: &dyn ScanProgress) -> ScanResult<SearchSummary> {
    let started = Instant::now();

    let keywords = KeywordSet::load(&config.keyword_file)?;
    info!(
        "Loaded {} keywords from {}",
        keywords.len(),
        config.keyword_file.display()
    );
    if keywords.is_empty() {
        warn!("Keyword list is empty; no rows will match");
    }

    let files = discover_files(&config.search_directory)?;
    info!(
        "Searching {} workbooks under {}",
        files.len(),
        config.search_directory.display()
    );

    let output = scan_files(&files, &keywords, config.thread_count, progress)?;

    let writer = ResultWriter::new(&config.output_path);
    writer.write(&output.records)?;

    let summary = SearchSummary {
        keywords: keywords.len(),
        files_discovered: files.len(),
        files_scanned: output.files_scanned,
        files_with_matches: output.files_with_matches,
        rows_scanned: output.rows_scanned,
        total_matches: output.total_matches(),
        failures: output.failures,
        output_path: writer.path().to_path_buf(),
        elapsed: started.elapsed(),
    };
    info!(
        "Search complete. Found {} matching rows in {} workbooks, wrote {}",
        summary.total_matches,
        summary.files_with_matches,
        summary.output_path.display()
    );
    Ok(summary)
}
