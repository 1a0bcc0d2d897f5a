/// Result types produced by a scan.
///
/// Workers build one [`FileOutcome`] per workbook and hand it to the aggregator by
/// value. Records are never touched again after creation; the aggregator only
/// appends whole batches to [`ScanOutput`], so the rows of one file stay together
/// and keep their source order.
use std::path::PathBuf;

use crate::errors::ScanError;

/// One matching row: the source file's base name followed by the row's cells
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchRecord {
    pub file_name: String,
    pub cells: Vec<String>,
}

impl MatchRecord {
    pub fn new(file_name: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            file_name: file_name.into(),
            cells,
        }
    }

    /// Output columns: file name first, then the cells
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.file_name.as_str()).chain(self.cells.iter().map(String::as_str))
    }
}

/// Matches found in a single workbook
#[derive(Debug, Clone, Default)]
pub struct FileMatches {
    pub path: PathBuf,
    pub records: Vec<MatchRecord>,
    /// Non-empty rows read from the workbook
    pub rows_scanned: usize,
}

/// What happened to one candidate workbook
#[derive(Debug)]
pub enum FileOutcome {
    Scanned(FileMatches),
    Failed { path: PathBuf, error: ScanError },
}

impl FileOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            FileOutcome::Scanned(matches) => &matches.path,
            FileOutcome::Failed { path, .. } => path,
        }
    }

    pub fn match_count(&self) -> usize {
        match self {
            FileOutcome::Scanned(matches) => matches.records.len(),
            FileOutcome::Failed { .. } => 0,
        }
    }
}

/// A workbook that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// The merged result of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// All match records, grouped by file in completion order
    pub records: Vec<MatchRecord>,
    /// Workbooks that completed, successfully or not
    pub files_scanned: usize,
    pub files_with_matches: usize,
    pub rows_scanned: usize,
    pub failures: Vec<FileFailure>,
}

impl ScanOutput {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends one file's outcome. A failed file contributes no records.
    pub fn add_outcome(&mut self, outcome: FileOutcome) {
        self.files_scanned += 1;
        match outcome {
            FileOutcome::Scanned(matches) => {
                self.rows_scanned += matches.rows_scanned;
                if !matches.records.is_empty() {
                    self.files_with_matches += 1;
                    self.records.extend(matches.records);
                }
            }
            FileOutcome::Failed { path, error } => {
                self.failures.push(FileFailure {
                    path,
                    message: error.to_string(),
                });
            }
        }
    }

    pub fn total_matches(&self) -> usize {
        self.records.len()
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }
}
