//! Row search across a tree of workbooks.
//!
//! [`engine`] discovers workbooks and fans them out over a worker pool,
//! [`processor`] is the unit of work run for each file, and [`matcher`] holds the
//! row predicate. Outcomes flow back over a channel to a single aggregator, so
//! no result state is shared between workers.
pub mod engine;
pub mod matcher;
pub mod processor;

pub use engine::{discover_files, run_search, scan_files, SearchSummary};
pub use matcher::{row_matches, RowMatcher};
pub use processor::FileProcessor;
