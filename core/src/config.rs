//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [history]
//! max_undo = 100   # 0 = unbounded
//!
//! [events]
//! enabled = true
//! ```
//!
//! Every table and field is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::edit::DEFAULT_MAX_UNDO;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub events: EventsConfig,
}

/// Undo history settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of edits kept; `0` disables the bound.
    pub max_undo: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
        }
    }
}

/// Event bus settings, applied to buses built from this configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub enabled: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl EngineConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            source,
        })
    }
}

/// Load a configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: EngineConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Loaded engine config from {} (max_undo = {}, events enabled = {})",
        path.display(),
        config.history.max_undo,
        config.events.enabled
    );
    Ok(config)
}

/// Load a configuration, falling back to defaults if it can't be read or parsed.
pub fn load_or_default(path: &Path) -> EngineConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("No engine config ({e}), using defaults");
            EngineConfig::default()
        }
    }
}
