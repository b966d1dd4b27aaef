//! Namespaced JSON storage on top of a [`KeyValueStore`].
//!
//! The service adds four things to the raw store:
//! - every key is prefixed with a fixed namespace,
//! - values are serialized as JSON (and parsed back, falling back to the raw string),
//! - reads are served from an in-memory cache kept in step with every write,
//! - failures are caught and logged instead of propagated.
//!
//! The only fallible entry points are [`StorageService::write_item`], used by the
//! config manager, and [`StorageService::import_data`], which rejects malformed
//! backups.

mod backup;

pub use backup::{BACKUP_VERSION, StorageBackup};

use crate::error::{Error, Result};
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// Default namespace prefix for every key written by the service.
pub const DEFAULT_PREFIX: &str = "@autism_app:";

/// Default soft size limit for a single serialized value (1 MiB).
pub const DEFAULT_SOFT_LIMIT_BYTES: usize = 1024 * 1024;

/// Construction options for [`StorageService`].
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Namespace prepended to every key.
    pub prefix: String,
    /// Payloads larger than this are written but logged as a warning.
    pub soft_limit_bytes: usize,
    /// Whether reads and writes use the cache unless told otherwise.
    pub cache_enabled: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            soft_limit_bytes: DEFAULT_SOFT_LIMIT_BYTES,
            cache_enabled: true,
        }
    }
}

/// Per-call write options.
#[derive(Debug, Clone, Copy)]
pub struct SetOptions {
    pub use_cache: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

/// Per-call read options.
#[derive(Debug, Clone, Copy)]
pub struct GetOptions {
    pub use_cache: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

/// Size and type of one stored key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub key: String,
    pub size: usize,
    pub value_type: String,
}

/// Diagnostic summary of what the service has stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub total_size: usize,
    pub key_count: usize,
    pub keys: Vec<KeyInfo>,
    pub cache_size: usize,
}

/// Namespaced, cached JSON storage.
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
    options: StorageOptions,
    cache: Mutex<HashMap<String, Value>>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_options(store, StorageOptions::default())
    }

    pub fn with_options(store: Arc<dyn KeyValueStore>, options: StorageOptions) -> Self {
        Self {
            store,
            options,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.options.prefix
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.options.prefix, key)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    /// Serialize a value, warning when it exceeds the soft limit.
    fn serialize(&self, key: &str, value: &Value) -> Result<String> {
        let payload = serde_json::to_string(value)?;
        if payload.len() > self.options.soft_limit_bytes {
            warn!(
                key = %key,
                size = payload.len(),
                limit = self.options.soft_limit_bytes,
                "Stored value exceeds soft size limit"
            );
        }
        Ok(payload)
    }

    fn update_cache(&self, key: &str, value: Value, use_cache: bool) {
        let mut cache = self.cache();
        if use_cache && self.options.cache_enabled {
            cache.insert(key.to_string(), value);
        } else {
            cache.remove(key);
        }
    }

    /// Write a value and return the error on failure.
    ///
    /// The cache is only touched after the store acknowledges the write.
    pub async fn write_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.write_item_with(key, value, SetOptions::default()).await
    }

    async fn write_item_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        opts: SetOptions,
    ) -> Result<()> {
        Self::check_key(key)?;
        let value = serde_json::to_value(value)?;
        let payload = self.serialize(key, &value)?;
        self.store.set(&self.namespaced(key), &payload).await?;
        self.update_cache(key, value, opts.use_cache);
        debug!(key = %key, size = payload.len(), "Stored item");
        Ok(())
    }

    /// Write a value. Returns `false` (and logs) on any failure.
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.set_item_with(key, value, SetOptions::default()).await
    }

    pub async fn set_item_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        opts: SetOptions,
    ) -> bool {
        match self.write_item_with(key, value, opts).await {
            Ok(()) => true,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to store item");
                false
            }
        }
    }

    /// Read a value. Returns `None` when absent or on any failure.
    pub async fn get_item(&self, key: &str) -> Option<Value> {
        self.get_item_with(key, GetOptions::default()).await
    }

    pub async fn get_item_with(&self, key: &str, opts: GetOptions) -> Option<Value> {
        if key.is_empty() {
            warn!("Ignoring read of empty storage key");
            return None;
        }

        let use_cache = opts.use_cache && self.options.cache_enabled;
        if use_cache && let Some(value) = self.cache().get(key) {
            debug!(key = %key, "Cache hit");
            return Some(value.clone());
        }

        match self.store.get(&self.namespaced(key)).await {
            Ok(Some(raw)) => {
                let value = parse_stored(raw);
                if use_cache {
                    self.cache().insert(key.to_string(), value.clone());
                }
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                error!(key = %key, error = %e, "Failed to read item");
                None
            }
        }
    }

    /// Read and deserialize a value, falling back to `default`.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get_item(key).await {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Stored item has unexpected shape, using default");
                default
            }),
            None => default,
        }
    }

    /// Remove a value from both the cache and the store.
    pub async fn remove_item(&self, key: &str) -> bool {
        if key.is_empty() {
            warn!("Ignoring removal of empty storage key");
            return false;
        }
        match self.store.remove(&self.namespaced(key)).await {
            Ok(()) => {
                self.cache().remove(key);
                true
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to remove item");
                false
            }
        }
    }

    /// Write several entries in one batch.
    pub async fn multi_set(&self, entries: &[(String, Value)]) -> bool {
        let mut payloads = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if let Err(e) = Self::check_key(key) {
                error!(error = %e, "Rejected batch write");
                return false;
            }
            match self.serialize(key, value) {
                Ok(payload) => payloads.push((self.namespaced(key), payload)),
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to serialize batch item");
                    return false;
                }
            }
        }

        match self.store.multi_set(&payloads).await {
            Ok(()) => {
                for (key, value) in entries {
                    self.update_cache(key, value.clone(), true);
                }
                debug!(count = entries.len(), "Stored batch");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to store batch");
                false
            }
        }
    }

    /// Read several keys. Absent keys (and every key, on failure) map to `None`.
    pub async fn multi_get(&self, keys: &[&str]) -> BTreeMap<String, Option<Value>> {
        let mut result: BTreeMap<String, Option<Value>> =
            keys.iter().map(|k| (k.to_string(), None)).collect();

        let namespaced: Vec<String> = keys.iter().map(|k| self.namespaced(k)).collect();
        match self.store.multi_get(&namespaced).await {
            Ok(pairs) => {
                for ((_, raw), key) in pairs.into_iter().zip(keys) {
                    if let Some(raw) = raw {
                        let value = parse_stored(raw);
                        if self.options.cache_enabled {
                            self.cache().insert(key.to_string(), value.clone());
                        }
                        result.insert(key.to_string(), Some(value));
                    }
                }
            }
            Err(e) => error!(error = %e, "Failed to read batch"),
        }
        result
    }

    /// Every key written by this service, with the prefix stripped.
    pub async fn get_all_keys(&self) -> Vec<String> {
        match self.list_namespaced().await {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to list keys");
                Vec::new()
            }
        }
    }

    async fn list_namespaced(&self) -> Result<Vec<String>> {
        let keys = self.store.list_keys().await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.options.prefix).map(str::to_string))
            .collect())
    }

    /// Remove every namespaced key and empty the cache.
    ///
    /// Keys outside the namespace are left alone.
    pub async fn clear(&self) -> bool {
        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to list keys for clear");
                return false;
            }
        };
        let ours: Vec<String> = keys
            .into_iter()
            .filter(|k| k.starts_with(&self.options.prefix))
            .collect();

        match self.store.multi_remove(&ours).await {
            Ok(()) => {
                self.cache().clear();
                debug!(count = ours.len(), "Cleared namespaced storage");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to clear storage");
                false
            }
        }
    }

    /// Aggregate size, per-key size and type, and cache size.
    pub async fn get_storage_info(&self) -> Option<StorageInfo> {
        let keys = match self.list_namespaced().await {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to list keys for storage info");
                return None;
            }
        };
        let namespaced: Vec<String> = keys.iter().map(|k| self.namespaced(k)).collect();
        let pairs = match self.store.multi_get(&namespaced).await {
            Ok(pairs) => pairs,
            Err(e) => {
                error!(error = %e, "Failed to read storage info");
                return None;
            }
        };

        let mut infos = Vec::with_capacity(keys.len());
        let mut total_size = 0;
        for ((_, raw), key) in pairs.into_iter().zip(keys) {
            let Some(raw) = raw else { continue };
            let size = raw.len();
            total_size += size;
            infos.push(KeyInfo {
                key,
                size,
                value_type: value_type(&parse_stored(raw)).to_string(),
            });
        }

        Some(StorageInfo {
            total_size,
            key_count: infos.len(),
            keys: infos,
            cache_size: self.cache_len(),
        })
    }

    /// Dump every namespaced key into a backup.
    pub async fn export_data(&self) -> Option<StorageBackup> {
        let keys = match self.list_namespaced().await {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to list keys for export");
                return None;
            }
        };
        let namespaced: Vec<String> = keys.iter().map(|k| self.namespaced(k)).collect();
        match self.store.multi_get(&namespaced).await {
            Ok(pairs) => {
                let data = pairs
                    .into_iter()
                    .zip(keys)
                    .filter_map(|((_, raw), key)| raw.map(|raw| (key, parse_stored(raw))))
                    .collect();
                Some(StorageBackup::new(data))
            }
            Err(e) => {
                error!(error = %e, "Failed to export storage");
                None
            }
        }
    }

    /// Restore a backup produced by [`export_data`](Self::export_data).
    ///
    /// Existing keys not present in the backup are kept. Fails with
    /// `InvalidBackupFormat` when the payload has no `data` object; returns
    /// `Ok(false)` when the store rejects the write.
    pub async fn import_data(&self, backup: Value) -> Result<bool> {
        let backup = StorageBackup::from_value(backup)?;
        let entries: Vec<(String, Value)> = backup.data.into_iter().collect();
        Ok(self.multi_set(&entries).await)
    }

    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }
}

/// Parse a stored payload as JSON, falling back to the raw string.
fn parse_stored(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
