/// Error types for sheetscout.
///
/// Errors fall into two groups. Failures local to one candidate workbook
/// (`Read`) are caught at the per-file boundary by the coordinator and recorded as a
/// failed outcome; the scan carries on. Everything else (configuration, keyword
/// loading, discovery, writing the result workbook) is fatal to the run and is
/// propagated to the caller with `?`:
/// ```rust,ignore
/// match run_search(&config, &progress) {
///     Ok(summary) => // Report counts,
///     Err(ScanError::UnsupportedFileType(path)) => // Keyword file is not a workbook,
///     Err(e) => // Report and stop
/// }
/// ```
use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur while configuring, scanning or writing
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(
        "Configuration file not found. A template was created at {0}; \
         fill in search_directory and excel_file_path, then run again"
    )]
    ConfigMissing(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unsupported keyword file type: {0} (expected .xlsx or .xls)")]
    UnsupportedFileType(PathBuf),
    #[error("Failed to load keywords from {path}: {reason}")]
    KeywordLoad { path: PathBuf, reason: String },
    #[error("Search directory not found: {0}")]
    SearchRootNotFound(PathBuf),
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("Failed to write results to {path}: {reason}")]
    Write { path: PathBuf, reason: String },
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    pub fn config_missing(path: impl Into<PathBuf>) -> Self {
        Self::ConfigMissing(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn unsupported_file_type(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFileType(path.into())
    }

    pub fn keyword_load(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self::KeywordLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn search_root_not_found(path: impl Into<PathBuf>) -> Self {
        Self::SearchRootNotFound(path.into())
    }

    pub fn read(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn worker_pool(msg: impl Display) -> Self {
        Self::WorkerPool(msg.to_string())
    }
}
