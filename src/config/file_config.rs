//! Configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! [indicators]
//! year_count = 5
//! include_sub_organizations = true
//! today = "2024-01-15"
//! visible = ["scimago_journal_paper_count", "permanent_researcher_fte"]
//!
//! [scimago]
//! base_url = "https://www.scimagojr.com/"
//! search_columns_by_name = true
//! timeout_seconds = 30
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use std::path::{Path, PathBuf};

use super::Config;

const CONFIG_FILE_NAME: &str = "lab-indicators.toml";

/// Per-user configuration file, e.g. `~/.config/lab-indicators/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lab-indicators").join("config.toml"))
}

/// First existing configuration file: `./lab-indicators.toml`, then the
/// per-user one
pub fn find_config_file() -> Option<PathBuf> {
    std::iter::once(Some(PathBuf::from(CONFIG_FILE_NAME)))
        .chain(std::iter::once(default_config_path()))
        .flatten()
        .find(|path| path.is_file())
}

impl Config {
    /// Load configuration from a TOML file, without environment overrides
    pub fn load_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file, creating its directory
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
