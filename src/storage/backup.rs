//! Full-storage backup format.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Backup format version.
pub const BACKUP_VERSION: &str = "1.0.0";

/// Every namespaced key of a [`StorageService`](super::StorageService), with the
/// prefix stripped, tagged with a timestamp and format version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageBackup {
    /// ISO 8601 timestamp of export
    pub timestamp: String,

    /// Backup format version (semver)
    pub version: String,

    /// Parsed values keyed by logical key.
    pub data: BTreeMap<String, Value>,
}

impl StorageBackup {
    pub fn new(data: BTreeMap<String, Value>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: BACKUP_VERSION.to_string(),
            data,
        }
    }

    /// Parse a backup, requiring a `data` object. Missing metadata is tolerated.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::InvalidBackupFormat(
                "backup must be a JSON object".to_string(),
            ));
        };
        let data = match map.remove("data") {
            Some(Value::Object(data)) => data.into_iter().collect(),
            Some(_) => {
                return Err(Error::InvalidBackupFormat(
                    "backup `data` must be an object".to_string(),
                ));
            }
            None => {
                return Err(Error::InvalidBackupFormat(
                    "backup is missing `data`".to_string(),
                ));
            }
        };
        let timestamp = map
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = map
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(BACKUP_VERSION)
            .to_string();

        Ok(Self {
            timestamp,
            version,
            data,
        })
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
