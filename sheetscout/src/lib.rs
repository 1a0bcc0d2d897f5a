pub mod config;
pub mod errors;
pub mod filters;
pub mod keywords;
pub mod metrics;
pub mod progress;
pub mod results;
pub mod search;
pub mod sheet;

pub use config::{ConfigOverrides, ScanConfig, SettingKey, Settings};
pub use errors::{ScanError, ScanResult};
pub use keywords::KeywordSet;
pub use progress::{BarProgress, ScanProgress, SilentProgress};
pub use results::{FileOutcome, MatchRecord, ScanOutput};
pub use search::{discover_files, run_search, scan_files, SearchSummary};
pub use sheet::{ResultWriter, SheetFile, SheetFormat, SheetReader};
