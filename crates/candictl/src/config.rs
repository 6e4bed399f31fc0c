//! Configuration management for candictl.
//!
//! Loads settings from a TOML file or uses defaults. Search order:
//! `--config`, `$CANDICT_CONFIG`, `<config dir>/candict/config.toml`.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::llm_client::LlmConfig;
use anyhow::{Context, Result};
use candict_shared::{AttributeNames, DisplayLimits};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "CANDICT_CONFIG";

/// Data document settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Document loaded at startup
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,

    /// Append every answered question to the JSONL query log
    #[serde(default = "default_query_log")]
    pub query_log: bool,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_query_log() -> bool {
    true
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            query_log: default_query_log(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub display: DisplayLimits,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    /// Source attribute names of the data document
    #[serde(default)]
    pub attributes: AttributeNames,
}

impl Config {
    /// Load config from the first path in the search order, or defaults
    pub fn load(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::load_from_path(path).unwrap_or_else(|e| {
                warn!("Config {} unusable, using defaults: {:#}", path.display(), e);
                Config::default()
            });
        }

        Self::search_paths()
            .into_iter()
            .find(|p| p.exists())
            .map(|p| {
                Self::load_from_path(&p).unwrap_or_else(|e| {
                    warn!("Config {} unusable, using defaults: {:#}", p.display(), e);
                    Config::default()
                })
            })
            .unwrap_or_else(|| {
                info!("No config file found, using defaults");
                Config::default()
            })
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("candict/config.toml"));
        }
        paths
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Effective config as TOML, for `candictl config`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data.path.is_none());
        assert_eq!(config.display.list_cap, 50);
        assert_eq!(config.display.match_cap, 5);
        assert_eq!(config.history.capacity, 50);
        assert!(config.history.query_log);
        assert!(!config.llm.enabled);
        assert_eq!(config.attributes.bus_type, "BusType");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [data]
            path = "/srv/can/data_dictionary.json"

            [display]
            match_cap = 3

            [llm]
            enabled = true
            endpoint = "http://127.0.0.1:11434"
            model = "llama3.2:3b"

            [attributes]
            id = "SPN"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.data.path.as_deref(),
            Some(Path::new("/srv/can/data_dictionary.json"))
        );
        assert_eq!(config.display.match_cap, 3);
        assert_eq!(config.display.list_cap, 50);
        assert!(config.llm.enabled);
        assert_eq!(config.llm.timeout_secs, 20);
        assert_eq!(config.attributes.id, "SPN");
        assert_eq!(config.attributes.description, "Description");
    }

    #[test]
    fn test_load_from_file_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("config.toml");
        fs::write(&good, "[history]\ncapacity = 7\n").unwrap();
        assert_eq!(Config::load(Some(&good)).history.capacity, 7);

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[history\ncapacity = ").unwrap();
        assert_eq!(Config::load(Some(&bad)), Config::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
