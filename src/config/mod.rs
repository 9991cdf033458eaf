//! Configuration management.

mod file_config;

pub use file_config::{default_config_path, find_config_file, ConfigFileError};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ranking::scimago::SCIMAGO_BASE_URL;

/// Prefix of the environment variables overriding the configuration,
/// e.g. `LAB_INDICATORS_INDICATORS__YEAR_COUNT=3`
pub const ENV_PREFIX: &str = "LAB_INDICATORS";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Indicator computation settings
    #[serde(default)]
    pub indicators: IndicatorConfig,

    /// Scimago platform settings
    #[serde(default)]
    pub scimago: ScimagoConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Indicator computation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Number of completed years covered by the annual indicators
    #[serde(default = "default_year_count")]
    pub year_count: u32,

    /// Whether members of sub-organizations are counted
    #[serde(default = "default_true")]
    pub include_sub_organizations: bool,

    /// Date used as "today" instead of the system date
    #[serde(default)]
    pub today: Option<NaiveDate>,

    /// Keys of the indicators to display (all when empty)
    #[serde(default)]
    pub visible: Vec<String>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            year_count: default_year_count(),
            include_sub_organizations: true,
            today: None,
            visible: Vec::new(),
        }
    }
}

impl IndicatorConfig {
    /// The configured date, or the current local date
    pub fn reference_date(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn default_year_count() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

/// Scimago platform configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScimagoConfig {
    /// Address of the Scimago website
    #[serde(default = "default_scimago_url")]
    pub base_url: String,

    /// Locate the table columns from their header instead of their position
    #[serde(default = "default_true")]
    pub search_columns_by_name: bool,

    /// Request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ScimagoConfig {
    fn default() -> Self {
        Self {
            base_url: default_scimago_url(),
            search_columns_by_name: true,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_scimago_url() -> String {
    SCIMAGO_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when neither `RUST_LOG` nor `-v`/`-q` is given
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Load configuration from an optional file, then from the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("indicators.visible")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // Tests reading the process environment must not overlap
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.indicators.year_count, 5);
        assert!(config.indicators.include_sub_organizations);
        assert!(config.scimago.search_columns_by_name);
        assert_eq!(config.scimago.base_url, "https://www.scimagojr.com/");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_reference_date() {
        let mut config = IndicatorConfig::default();
        let date = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        config.today = Some(date);
        assert_eq!(config.reference_date(), date);
    }

    #[test]
    fn test_load_config_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let path = dir.path().join("lab-indicators.toml");
        std::fs::write(
            &path,
            r#"
[indicators]
year_count = 3
today = "2024-06-01"
visible = ["scimago_journal_paper_count"]

[scimago]
search_columns_by_name = false
"#,
        )
        .unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.indicators.year_count, 3);
        assert_eq!(config.indicators.today, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(config.indicators.visible, vec!["scimago_journal_paper_count"]);
        assert!(config.indicators.include_sub_organizations);
        assert!(!config.scimago.search_columns_by_name);
        assert_eq!(config.scimago.timeout_seconds, 30);
    }

    #[test]
    fn test_environment_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("LAB_INDICATORS_INDICATORS__YEAR_COUNT", "3");
        std::env::set_var("LAB_INDICATORS_SCIMAGO__BASE_URL", "http://localhost:8080/");
        std::env::set_var("LAB_INDICATORS_INDICATORS__VISIBLE", "a_count,b_count");

        let config = load_config(None);

        std::env::remove_var("LAB_INDICATORS_INDICATORS__YEAR_COUNT");
        std::env::remove_var("LAB_INDICATORS_SCIMAGO__BASE_URL");
        std::env::remove_var("LAB_INDICATORS_INDICATORS__VISIBLE");

        let config = config.unwrap();
        assert_eq!(config.indicators.year_count, 3);
        assert_eq!(config.scimago.base_url, "http://localhost:8080/");
        assert_eq!(config.indicators.visible, vec!["a_count", "b_count"]);
        assert!(config.indicators.include_sub_organizations);
    }
}
