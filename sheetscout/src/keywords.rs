//! Loading the keyword list.
//!
//! Keywords come from column A of the first sheet of a workbook. Each non-empty
//! cell is trimmed and becomes one keyword; blank cells are skipped.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{ScanError, ScanResult};
use crate::filters::sheet_format;
use crate::sheet::SheetReader;

/// The set of literal substrings a row is searched for.
///
/// Only membership matters: order is kept from the source for logging but has no
/// effect on which rows match. Duplicates are dropped on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Builds a set from raw values, trimming each and skipping blanks
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.clone()))
            .collect();
        Self { keywords }
    }

    /// Reads keywords from the first column of the first sheet of `path`.
    ///
    /// The extension is checked before the file is touched, so a `.csv` path fails
    /// with [`ScanError::UnsupportedFileType`] whether or not it exists.
    pub fn load(path: &Path) -> ScanResult<Self> {
        let format = sheet_format(path).ok_or_else(|| ScanError::unsupported_file_type(path))?;

        if !path.is_file() {
            return Err(ScanError::keyword_load(path, "file not found"));
        }

        let mut reader = SheetReader::open(path, format).map_err(|e| match e {
            ScanError::Read { reason, .. } => ScanError::keyword_load(path, reason),
            other => other,
        })?;
        let column = reader.first_column().map_err(|e| match e {
            ScanError::Read { reason, .. } => ScanError::keyword_load(path, reason),
            other => other,
        })?;
        debug!("Read {} cells from keyword column", column.len());

        let set = Self::new(column);
        info!("Loaded {} keywords from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}
