//! Dashboard Configuration
//! Source URL, request timeout, date policy and export file names.

use crate::data::DatePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Google Sheets CSV export of the sales tracker.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/16U4reJDdvGQb6lqN9LF-A2QVwsJdNBV1CqqcyuHcHXk/export?format=csv&gid=2006560046";

/// Optional override file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "ac_dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source_url: String,
    pub request_timeout_secs: u64,
    pub date_policy: DatePolicy,
    pub export_file_name: String,
    pub chart_file_name: String,
    pub window_title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            request_timeout_secs: 30,
            date_policy: DatePolicy::Lenient,
            export_file_name: "filtered_data.csv".to_string(),
            chart_file_name: "performance_metrics.png".to_string(),
            window_title: "Interactive Sales Tracker Dashboard".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read a JSON config file. Fields left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load `path` if it exists, falling back to defaults on any problem.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("{} ({}); using defaults", e, path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_original_dashboard() {
        let config = DashboardConfig::default();
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.export_file_name, "filtered_data.csv");
        assert_eq!(config.date_policy, DatePolicy::Lenient);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"source_url": "http://localhost/data.csv", "date_policy": "strict"}}"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source_url, "http://localhost/data.csv");
        assert_eq!(config.date_policy, DatePolicy::Strict);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn missing_or_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(CONFIG_FILE_NAME);
        assert_eq!(DashboardConfig::load_or_default(&missing), DashboardConfig::default());

        std::fs::write(&missing, "{ not json").unwrap();
        assert!(DashboardConfig::from_file(&missing).is_err());
        assert_eq!(DashboardConfig::load_or_default(&missing), DashboardConfig::default());
    }
}
