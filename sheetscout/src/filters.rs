/// Candidate selection for the scan.
///
/// A file takes part in the search when its extension names one of the two
/// workbook containers calamine can read. Nothing else about the path matters:
/// hidden files, files listed in `.gitignore` and the like are all candidates.
use std::path::Path;

use crate::sheet::SheetFormat;

/// Determines the workbook format of a path from its extension
pub fn sheet_format(path: &Path) -> Option<SheetFormat> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("xlsx") {
        Some(SheetFormat::Xlsx)
    } else if ext.eq_ignore_ascii_case("xls") {
        Some(SheetFormat::Xls)
    } else {
        None
    }
}

/// Checks if a file should be included in the search
pub fn is_candidate(path: &Path) -> bool {
    sheet_format(path).is_some()
}
