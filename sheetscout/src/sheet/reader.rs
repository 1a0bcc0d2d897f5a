use calamine::{open_workbook, Data, Range, Reader, Sheet, SheetType, Xls, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::trace;

use super::cell::{data_ref_text, data_text, trim_trailing_empty};
use super::{Row, SheetFormat};
use crate::errors::{ScanError, ScanResult};

enum Workbook {
    Xlsx(Xlsx<BufReader<File>>),
    Xls(Xls<BufReader<File>>),
}

/// An open workbook that yields its rows as text.
///
/// `.xlsx` sheets are streamed cell by cell, so only the row being assembled is
/// held in memory. `.xls` has no streaming API and each sheet is parsed as a
/// whole before its rows are visited.
///
/// The underlying file handle is released when the reader is dropped.
pub struct SheetReader {
    path: PathBuf,
    workbook: Workbook,
}

impl SheetReader {
    /// Opens `path` as a workbook of the given format
    pub fn open(path: &Path, format: SheetFormat) -> ScanResult<Self> {
        trace!("Opening {} workbook: {}", format, path.display());
        let workbook = match format {
            SheetFormat::Xlsx => Workbook::Xlsx(
                open_workbook::<Xlsx<_>, _>(path).map_err(|e| ScanError::read(path, e))?,
            ),
            SheetFormat::Xls => Workbook::Xls(
                open_workbook::<Xls<_>, _>(path).map_err(|e| ScanError::read(path, e))?,
            ),
        };
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }

    /// Visits every non-empty row of every sheet in workbook order
    pub fn for_each_row<F>(&mut self, mut visit: F) -> ScanResult<()>
    where
        F: FnMut(Row),
    {
        match &mut self.workbook {
            Workbook::Xlsx(workbook) => stream_xlsx_rows(workbook, &self.path, &mut visit),
            Workbook::Xls(workbook) => visit_sheet_ranges(workbook, &self.path, &mut visit),
        }
    }

    /// Text of column A in the first sheet, one entry per row (empty cells included)
    pub fn first_column(&mut self) -> ScanResult<Vec<String>> {
        let range = match &mut self.workbook {
            Workbook::Xlsx(workbook) => first_range(workbook, &self.path)?,
            Workbook::Xls(workbook) => first_range(workbook, &self.path)?,
        };
        let Some(range) = range else {
            return Ok(Vec::new());
        };

        // Range coordinates are relative to its first used cell
        let (_, start_col) = range.start().unwrap_or((0, 0));
        if start_col > 0 {
            return Ok(Vec::new());
        }
        Ok(range
            .rows()
            .map(|row| row.first().map(data_text).unwrap_or_default())
            .collect())
    }
}

/// Sheets that hold cells, in workbook order; chart sheets are skipped
fn worksheet_names(sheets: &[Sheet]) -> Vec<String> {
    sheets
        .iter()
        .filter(|sheet| matches!(sheet.typ, SheetType::WorkSheet))
        .map(|sheet| sheet.name.clone())
        .collect()
}

fn visit_sheet_ranges<R>(workbook: &mut R, path: &Path, visit: &mut dyn FnMut(Row)) -> ScanResult<()>
where
    R: Reader<BufReader<File>>,
    R::Error: std::fmt::Display,
{
    for name in worksheet_names(workbook.sheets_metadata()) {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ScanError::read(path, e))?;
        visit_range_rows(&range, visit);
    }
    Ok(())
}

fn first_range<R>(workbook: &mut R, path: &Path) -> ScanResult<Option<Range<Data>>>
where
    R: Reader<BufReader<File>>,
    R::Error: std::fmt::Display,
{
    let Some(name) = worksheet_names(workbook.sheets_metadata()).into_iter().next() else {
        return Ok(None);
    };
    workbook
        .worksheet_range(&name)
        .map(Some)
        .map_err(|e| ScanError::read(path, e))
}

fn stream_xlsx_rows(
    workbook: &mut Xlsx<BufReader<File>>,
    path: &Path,
    visit: &mut dyn FnMut(Row),
) -> ScanResult<()> {
    for name in worksheet_names(workbook.sheets_metadata()) {
        let mut cells = workbook
            .worksheet_cells_reader(&name)
            .map_err(|e| ScanError::read(path, e))?;

        let mut current_row: Option<u32> = None;
        let mut row: Row = Vec::new();

        while let Some(cell) = cells.next_cell().map_err(|e| ScanError::read(path, e))? {
            let (row_idx, col_idx) = cell.get_position();
            if current_row != Some(row_idx) {
                flush_row(&mut row, visit);
                current_row = Some(row_idx);
            }

            let text = data_ref_text(cell.get_value());
            if text.is_empty() {
                continue;
            }
            let col = col_idx as usize;
            if col < row.len() {
                // Cells arrive in column order; a repeat position is malformed input
                continue;
            }
            row.resize(col, String::new());
            row.push(text);
        }
        flush_row(&mut row, visit);
    }
    Ok(())
}

fn flush_row(row: &mut Row, visit: &mut dyn FnMut(Row)) {
    if !row.is_empty() {
        visit(std::mem::take(row));
    }
}

fn visit_range_rows(range: &Range<Data>, visit: &mut dyn FnMut(Row)) {
    let Some((_, start_col)) = range.start() else {
        return;
    };
    for cells in range.rows() {
        let mut row: Row = vec![String::new(); start_col as usize];
        row.extend(cells.iter().map(data_text));
        trim_trailing_empty(&mut row);
        if !row.is_empty() {
            visit(row);
        }
    }
}
