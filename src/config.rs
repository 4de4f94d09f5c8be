use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::grouping::GroupRuleConfig;
use crate::search::DEFAULT_SEARCH_LIMIT;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Local snapshot directory (overrides XDG default).
    pub data_dir: Option<PathBuf>,
    /// Base URL serving the snapshot files. Takes precedence over `data_dir`.
    pub base_url: Option<String>,
    /// HTTP timeout for snapshot fetches, in seconds.
    pub http_timeout_secs: u64,
    /// Maximum number of shows returned by a search.
    pub search_limit: usize,
    /// Show group rules, tried in order against performance names.
    pub groups: Vec<GroupRuleConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            base_url: None,
            http_timeout_secs: 30,
            search_limit: DEFAULT_SEARCH_LIMIT,
            groups: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/setheard/config.toml`.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    /// Logs a warning if the file can't be read or parsed.
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                return Self::default();
            }
        };
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default snapshot directory using XDG data directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        dirs.data_dir().join("data")
    } else {
        // Fallback: current directory
        PathBuf::from("data")
    }
}
