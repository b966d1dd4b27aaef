//! Runtime settings types.

use crate::storage::{DEFAULT_PREFIX, DEFAULT_SOFT_LIMIT_BYTES, StorageOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Namespace prefix for every stored key.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Values larger than this many bytes are logged as a warning.
    #[serde(default = "default_soft_limit")]
    pub soft_limit_bytes: usize,

    /// Serve reads from the in-memory cache.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            prefix: default_prefix(),
            soft_limit_bytes: default_soft_limit(),
            cache_enabled: true,
        }
    }
}

impl StorageSettings {
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            prefix: self.prefix.clone(),
            soft_limit_bytes: self.soft_limit_bytes,
            cache_enabled: self.cache_enabled,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("support-config").join("store.db"))
        .unwrap_or_else(|| PathBuf::from("support-config.db"))
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_soft_limit() -> usize {
    DEFAULT_SOFT_LIMIT_BYTES
}

fn default_true() -> bool {
    true
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive, e.g. `info` or `support_config=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// All runtime settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from a single YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }
}
