//! Workbook access: reading rows out of `.xlsx`/`.xls` files and writing the
//! consolidated result workbook.
//!
//! Cell values of every type are coerced to text at read time (see [`cell`]), so
//! the rest of the crate only ever sees rows of strings.

pub mod cell;
pub mod reader;
pub mod writer;

pub use reader::SheetReader;
pub use writer::{ResultWriter, RESULT_HEADER, RESULT_SHEET_NAME};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::filters::sheet_format;

/// One row of cell text, in column order starting at column A
pub type Row = Vec<String>;

/// Container format of a workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetFormat {
    /// Legacy BIFF binary workbook (`.xls`)
    Xls,
    /// Office Open XML zip workbook (`.xlsx`)
    Xlsx,
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetFormat::Xls => write!(f, "xls"),
            SheetFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// A candidate workbook found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetFile {
    pub path: PathBuf,
    pub format: SheetFormat,
    /// Base name, used as the first column of every match record
    pub file_name: String,
}

impl SheetFile {
    /// Builds a reference for `path`, or `None` when it is not a workbook
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let format = sheet_format(&path)?;
        let file_name = base_name(&path);
        Some(Self {
            path,
            format,
            file_name,
        })
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
