use crate::keywords::KeywordSet;
use crate::results::MatchRecord;

/// Returns true when any cell contains any keyword as a literal substring.
///
/// Matching is case-sensitive and applies no normalization to the cell text.
pub fn row_matches(row: &[String], keywords: &KeywordSet) -> bool {
    row.iter()
        .filter(|cell| !cell.is_empty())
        .any(|cell| keywords.iter().any(|keyword| cell.contains(keyword)))
}

/// Decides which rows of a workbook make it into the result set.
///
/// Holds no mutable state, so one matcher is shared by reference across all
/// workers.
#[derive(Debug, Clone, Copy)]
pub struct RowMatcher<'k> {
    keywords: &'k KeywordSet,
}

impl<'k> RowMatcher<'k> {
    pub fn new(keywords: &'k KeywordSet) -> Self {
        Self { keywords }
    }

    /// Builds the output record for `row` if it matches
    pub fn match_row(&self, file_name: &str, row: &[String]) -> Option<MatchRecord> {
        if row_matches(row, self.keywords) {
            Some(MatchRecord::new(file_name, row.to_vec()))
        } else {
            None
        }
    }
}
