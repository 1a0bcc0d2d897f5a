use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::sheet::SheetFormat;

/// Counters shared by every worker of a scan
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    rows_read: Arc<AtomicU64>,
    cells_read: Arc<AtomicU64>,
    rows_matched: Arc<AtomicU64>,

    xlsx_files: Arc<AtomicU64>,
    xls_files: Arc<AtomicU64>,
    failed_files: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            rows_read: Arc::new(AtomicU64::new(0)),
            cells_read: Arc::new(AtomicU64::new(0)),
            rows_matched: Arc::new(AtomicU64::new(0)),
            xlsx_files: Arc::new(AtomicU64::new(0)),
            xls_files: Arc::new(AtomicU64::new(0)),
            failed_files: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records one row handed to the matcher
    pub fn record_row(&self, cells: usize, matched: bool) {
        self.rows_read.fetch_add(1, Ordering::Relaxed);
        self.cells_read.fetch_add(cells as u64, Ordering::Relaxed);
        if matched {
            self.rows_matched.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a workbook that was read to the end
    pub fn record_file(&self, format: SheetFormat) {
        let counter = match format {
            SheetFormat::Xlsx => &self.xlsx_files,
            SheetFormat::Xls => &self.xls_files,
        };
        let total = counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Finished {} workbook #{}", format, total);
    }

    /// Records a workbook that could not be read
    pub fn record_failure(&self) {
        self.failed_files.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            rows_read: self.rows_read.load(Ordering::Relaxed),
            cells_read: self.cells_read.load(Ordering::Relaxed),
            rows_matched: self.rows_matched.load(Ordering::Relaxed),
            xlsx_files: self.xlsx_files.load(Ordering::Relaxed),
            xls_files: self.xls_files.load(Ordering::Relaxed),
            failed_files: self.failed_files.load(Ordering::Relaxed),
        }
    }

    /// Logs current scan statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Rows read: {}\n\
             Cells read: {}\n\
             Rows matched: {}\n\
             Workbooks (xlsx/xls/failed): {}/{}/{}",
            stats.rows_read,
            stats.cells_read,
            stats.rows_matched,
            stats.xlsx_files,
            stats.xls_files,
            stats.failed_files
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub rows_read: u64,
    pub cells_read: u64,
    pub rows_matched: u64,
    pub xlsx_files: u64,
    pub xls_files: u64,
    pub failed_files: u64,
}
