use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{ScanError, ScanResult};
use crate::results::MatchRecord;

/// Header row of the result workbook: file name, then the matched row's cells
pub const RESULT_HEADER: [&str; 2] = ["文件名", "匹配行内容"];

/// Name of the single sheet in the result workbook
pub const RESULT_SHEET_NAME: &str = "搜索结果";

/// Serializes match records into a single-sheet workbook
#[derive(Debug, Clone)]
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the header and every record in the given order, replacing any
    /// existing file at the output path
    pub fn write(&self, records: &[MatchRecord]) -> ScanResult<()> {
        debug!(
            "Writing {} records to {}",
            records.len(),
            self.path.display()
        );
        let write_err = |e: rust_xlsxwriter::XlsxError| ScanError::write(&self.path, e);

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(RESULT_SHEET_NAME).map_err(write_err)?;

        for (col, title) in RESULT_HEADER.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, *title, &header_format)
                .map_err(write_err)?;
        }

        for (index, record) in records.iter().enumerate() {
            let row = u32::try_from(index + 1)
                .map_err(|_| ScanError::write(&self.path, "too many result rows"))?;
            for (col, value) in record.fields().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let col = u16::try_from(col)
                    .map_err(|_| ScanError::write(&self.path, "too many result columns"))?;
                sheet.write_string(row, col, value).map_err(write_err)?;
            }
        }

        workbook.save(&self.path).map_err(write_err)?;
        info!("Results saved to {}", self.path.display());
        Ok(())
    }
}
