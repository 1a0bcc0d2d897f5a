use config::Config as ConfigBuilder;
use ini::{Ini, ParseOption};
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::errors::{ScanError, ScanResult};

/// Default location of the settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.ini";

/// Default name of the result workbook
pub const DEFAULT_OUTPUT_PATH: &str = "搜索结果.xlsx";

const SECTION: &str = "Settings";

/// Written on first run; the operator replaces the placeholders and re-runs
const TEMPLATE: &str = "[Settings]\n\
search_directory = 输入你要搜索的文件夹路径\n\
excel_file_path = 输入包含关键词的Excel路径\n";

/// The keys understood in the `[Settings]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    SearchDirectory,
    KeywordFile,
    OutputPath,
    ThreadCount,
    LogLevel,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::SearchDirectory,
        SettingKey::KeywordFile,
        SettingKey::OutputPath,
        SettingKey::ThreadCount,
        SettingKey::LogLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::SearchDirectory => "search_directory",
            SettingKey::KeywordFile => "excel_file_path",
            SettingKey::OutputPath => "output_path",
            SettingKey::ThreadCount => "thread_count",
            SettingKey::LogLevel => "log_level",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ScanError::config_error(format!(
                    "Unknown setting '{}'. Valid keys: {}",
                    s,
                    SettingKey::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

/// Raw contents of the `[Settings]` section of the INI file.
///
/// The file format looks like this:
/// ```ini
/// [Settings]
/// search_directory = D:/reports
/// excel_file_path = D:\data\keywords.xlsx
/// ; optional
/// output_path = 搜索结果.xlsx
/// thread_count = 8
/// log_level = info
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub search_directory: String,
    #[serde(default)]
    pub excel_file_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub thread_count: Option<usize>,
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IniDocument {
    #[serde(default)]
    settings: Settings,
}

/// Parses INI text with backslashes taken literally, so Windows paths such as
/// `D:\data\reports` survive, then lets `config` do the typed deserialization.
fn parse_settings(text: &str) -> Result<Settings, String> {
    let options = ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(text, options).map_err(|e| e.to_string())?;

    let mut builder = ConfigBuilder::builder();
    let section = ini
        .iter()
        .find(|(name, _)| name.is_some_and(|n| n.trim().eq_ignore_ascii_case(SECTION)));
    if let Some((_, properties)) = section {
        for (key, value) in properties.iter() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            builder = builder
                .set_override(format!("settings.{}", key.trim().to_ascii_lowercase()), value)
                .map_err(|e| e.to_string())?;
        }
    }

    let document: IniDocument = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| e.to_string())?;
    Ok(document.settings)
}

impl Settings {
    /// Loads the settings file, creating a template and returning
    /// [`ScanError::ConfigMissing`] when it does not exist yet
    pub fn load(path: &Path) -> ScanResult<Self> {
        if !path.exists() {
            std::fs::write(path, TEMPLATE)?;
            info!("Created configuration template at {}", path.display());
            return Err(ScanError::config_missing(path));
        }

        let text = std::fs::read_to_string(path)?;
        parse_settings(&text)
            .map_err(|e| ScanError::config_error(format!("{}: {}", path.display(), e)))
    }

    /// Writes the settings back as an INI file
    pub fn save(&self, path: &Path) -> ScanResult<()> {
        let mut content = format!("[{}]\n", SECTION);
        for (key, value) in self.entries() {
            if let Some(value) = value {
                content.push_str(&format!("{} = {}\n", key, value));
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Every key with its current value, `None` for unset optional keys
    pub fn entries(&self) -> Vec<(SettingKey, Option<String>)> {
        SettingKey::ALL
            .into_iter()
            .map(|key| (key, self.get(key)))
            .collect()
    }

    pub fn get(&self, key: SettingKey) -> Option<String> {
        match key {
            SettingKey::SearchDirectory => Some(self.search_directory.clone()),
            SettingKey::KeywordFile => Some(self.excel_file_path.clone()),
            SettingKey::OutputPath => self.output_path.clone(),
            SettingKey::ThreadCount => self.thread_count.map(|n| n.to_string()),
            SettingKey::LogLevel => self.log_level.clone(),
        }
    }

    /// Sets one key; an empty value clears an optional key
    pub fn set(&mut self, key: SettingKey, value: &str) -> ScanResult<()> {
        let value = value.trim();
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        match key {
            SettingKey::SearchDirectory => self.search_directory = value.to_string(),
            SettingKey::KeywordFile => self.excel_file_path = value.to_string(),
            SettingKey::OutputPath => self.output_path = optional(value),
            SettingKey::LogLevel => self.log_level = optional(value),
            SettingKey::ThreadCount => {
                self.thread_count = if value.is_empty() {
                    None
                } else {
                    Some(parse_thread_count(value)?.get())
                };
            }
        }
        Ok(())
    }
}

fn parse_thread_count(value: &str) -> ScanResult<NonZeroUsize> {
    value
        .parse::<NonZeroUsize>()
        .map_err(|_| ScanError::config_error(format!("thread_count must be a positive integer, got '{}'", value)))
}

fn required(key: SettingKey, value: &str) -> ScanResult<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ScanError::config_error(format!("{} is not set", key)));
    }
    Ok(PathBuf::from(value))
}

/// Validated configuration for one search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Root directory searched recursively for workbooks
    pub search_directory: PathBuf,
    /// Workbook whose first column lists the keywords
    pub keyword_file: PathBuf,
    /// Result workbook, overwritten on every run
    pub output_path: PathBuf,
    /// Number of worker threads
    pub thread_count: NonZeroUsize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Values given on the command line, each overriding the settings file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub search_directory: Option<PathBuf>,
    pub keyword_file: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub thread_count: Option<NonZeroUsize>,
    pub log_level: Option<String>,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl ScanConfig {
    pub fn new(search_directory: impl Into<PathBuf>, keyword_file: impl Into<PathBuf>) -> Self {
        Self {
            search_directory: search_directory.into(),
            keyword_file: keyword_file.into(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            thread_count: default_thread_count(),
            log_level: default_log_level(),
        }
    }

    /// Loads and validates the settings file at `path`
    pub fn load_from(path: &Path) -> ScanResult<Self> {
        Self::from_settings(&Settings::load(path)?)
    }

    /// Checks that both required paths are present and fills defaults
    pub fn from_settings(settings: &Settings) -> ScanResult<Self> {
        let search_directory = required(SettingKey::SearchDirectory, &settings.search_directory)?;
        let keyword_file = required(SettingKey::KeywordFile, &settings.excel_file_path)?;

        let mut config = Self::new(search_directory, keyword_file);
        if let Some(output) = settings.output_path.as_deref().map(str::trim) {
            if !output.is_empty() {
                config.output_path = PathBuf::from(output);
            }
        }
        if let Some(count) = settings.thread_count {
            config.thread_count = NonZeroUsize::new(count)
                .ok_or_else(|| ScanError::config_error("thread_count must be at least 1"))?;
        }
        if let Some(level) = settings.log_level.as_deref().map(str::trim) {
            if !level.is_empty() {
                config.log_level = level.to_string();
            }
        }
        Ok(config)
    }

    /// Merges command line values over the file values
    pub fn merge_with_cli(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(dir) = overrides.search_directory {
            self.search_directory = dir;
        }
        if let Some(file) = overrides.keyword_file {
            self.keyword_file = file;
        }
        if let Some(output) = overrides.output_path {
            self.output_path = output;
        }
        if let Some(threads) = overrides.thread_count {
            self.thread_count = threads;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[Settings]\n\
             search_directory = /data/reports\n\
             excel_file_path = /data/keywords.xlsx\n\
             output_path = /tmp/result.xlsx\n\
             thread_count = 4\n\
             log_level = debug\n",
        )
        .unwrap();

        let config = ScanConfig::load_from(&config_path).unwrap();
        assert_eq!(config.search_directory, PathBuf::from("/data/reports"));
        assert_eq!(config.keyword_file, PathBuf::from("/data/keywords.xlsx"));
        assert_eq!(config.output_path, PathBuf::from("/tmp/result.xlsx"));
        assert_eq!(config.thread_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[Settings]\nsearch_directory = data\nexcel_file_path = words.xlsx\n",
        )
        .unwrap();

        let config = ScanConfig::load_from(&config_path).unwrap();
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(config.thread_count, default_thread_count());
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_missing_file_creates_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.ini");

        let result = Settings::load(&config_path);
        assert!(matches!(result, Err(ScanError::ConfigMissing(_))));

        let written = std::fs::read_to_string(&config_path).unwrap();
        assert!(written.starts_with("[Settings]"));
        assert!(written.contains("search_directory = "));
        assert!(written.contains("excel_file_path = "));

        // The template parses; its placeholder values are caught later when the
        // paths are checked for existence
        let settings = Settings::load(&config_path).unwrap();
        assert!(!settings.search_directory.is_empty());
        assert!(!settings.excel_file_path.is_empty());
    }

    #[test]
    fn test_blank_required_key() {
        let settings = Settings {
            search_directory: "  ".to_string(),
            excel_file_path: "words.xlsx".to_string(),
            ..Default::default()
        };
        let err = ScanConfig::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("search_directory"));

        let settings = Settings {
            search_directory: "data".to_string(),
            ..Default::default()
        };
        let err = ScanConfig::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("excel_file_path"));
    }

    #[test]
    fn test_zero_thread_count() {
        let settings = Settings {
            search_directory: "data".to_string(),
            excel_file_path: "words.xlsx".to_string(),
            thread_count: Some(0),
            ..Default::default()
        };
        assert!(ScanConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_set_and_save_round_trip() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.ini");

        let mut settings = Settings::default();
        settings.set(SettingKey::SearchDirectory, " /srv/sheets ").unwrap();
        settings.set("excel_file_path".parse().unwrap(), "/srv/k.xlsx").unwrap();
        settings.set(SettingKey::ThreadCount, "6").unwrap();
        assert!(settings.set(SettingKey::ThreadCount, "zero").is_err());
        settings.save(&config_path).unwrap();

        let loaded = Settings::load(&config_path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.search_directory, "/srv/sheets");
        assert_eq!(loaded.thread_count, Some(6));
        assert_eq!(loaded.output_path, None);
    }

    #[test]
    fn test_windows_path_round_trip() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.ini");

        let mut settings = Settings::default();
        settings.set(SettingKey::SearchDirectory, r"D:\reports\2024").unwrap();
        settings.set(SettingKey::KeywordFile, r"D:\keywords.xlsx").unwrap();
        settings.save(&config_path).unwrap();

        assert_eq!(Settings::load(&config_path).unwrap(), settings);
    }

    #[test]
    fn test_hand_written_windows_paths() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[Settings]\r\n\
             search_directory = D:\\data\\报表\r\n\
             excel_file_path = C:\\x\\keywords.xlsx\r\n\
             output_path = data\\sub\\out.xlsx\r\n",
        )
        .unwrap();

        let config = ScanConfig::load_from(&config_path).unwrap();
        assert_eq!(config.search_directory, PathBuf::from(r"D:\data\报表"));
        assert_eq!(config.keyword_file, PathBuf::from(r"C:\x\keywords.xlsx"));
        assert_eq!(config.output_path, PathBuf::from(r"data\sub\out.xlsx"));

        // Saving writes the paths back unchanged
        Settings::load(&config_path).unwrap().save(&config_path).unwrap();
        let saved = std::fs::read_to_string(&config_path).unwrap();
        assert!(saved.contains(r"search_directory = D:\data\报表"));
        assert!(saved.contains(r"excel_file_path = C:\x\keywords.xlsx"));
    }

    #[test]
    fn test_section_name_is_case_insensitive() {
        let settings = parse_settings(
            "; comment\n[settings]\nSEARCH_DIRECTORY = data\nexcel_file_path = k.xlsx\nthread_count =\n",
        )
        .unwrap();
        assert_eq!(settings.search_directory, "data");
        assert_eq!(settings.excel_file_path, "k.xlsx");
        assert_eq!(settings.thread_count, None);

        let settings = parse_settings("[Other]\nsearch_directory = data\n").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unknown_key() {
        let err = "colour".parse::<SettingKey>().unwrap_err();
        assert!(err.to_string().contains("search_directory"));
        assert_eq!(
            "THREAD_COUNT".parse::<SettingKey>().unwrap(),
            SettingKey::ThreadCount
        );
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = ScanConfig::new("data", "words.xlsx");

        let merged = file_config.clone().merge_with_cli(ConfigOverrides {
            search_directory: Some(PathBuf::from("other")),
            thread_count: NonZeroUsize::new(2),
            ..Default::default()
        });
        assert_eq!(merged.search_directory, PathBuf::from("other")); // CLI value
        assert_eq!(merged.keyword_file, PathBuf::from("words.xlsx")); // File value
        assert_eq!(merged.thread_count, NonZeroUsize::new(2).unwrap()); // CLI value
        assert_eq!(merged.output_path, file_config.output_path); // File value
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[Settings]\nsearch_directory = a\nexcel_file_path = b.xlsx\nthread_count = many\n",
        )
        .unwrap();

        let result = ScanConfig::load_from(&config_path);
        assert!(matches!(result, Err(ScanError::ConfigError(_))));
    }
}
