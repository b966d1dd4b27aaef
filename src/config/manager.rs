//! Config manager: owns the live configuration document.
//!
//! The live document sits behind an [`ArcSwap`], so readers never block and
//! always see a complete, validated document. Every mutation:
//!
//! 1. takes the write lock (mutations are serialized),
//! 2. builds a candidate from the current snapshot,
//! 3. re-parses the candidate through the typed schema and validates it,
//! 4. persists it,
//! 5. swaps it in and notifies listeners.
//!
//! A failure at any step leaves the live document untouched.

use super::checksum::checksum;
use super::document::{Category, ConfigDocument};
use super::events::{ConfigEvent, ListenerGuard, ListenerRegistry};
use super::merge::deep_merge;
use super::path;
use super::validate::validate_config;
use crate::error::{Error, Result};
use crate::storage::StorageService;
use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Logical storage key of the persisted document.
pub const CONFIG_STORAGE_KEY: &str = "app_config";

/// Export format version (semver).
pub const EXPORT_VERSION: &str = "1.0.0";

/// Lifecycle of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized = 0,
    Loading = 1,
    Ready = 2,
}

impl Lifecycle {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Lifecycle::Loading,
            2 => Lifecycle::Ready,
            _ => Lifecycle::Uninitialized,
        }
    }
}

/// Portable, checksummed copy of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigExport {
    pub config: ConfigDocument,
    /// ISO 8601 timestamp of export
    pub exported_at: String,
    pub version: String,
    pub checksum: String,
}

pub struct ConfigManager {
    storage: Arc<StorageService>,
    document: ArcSwap<ConfigDocument>,
    listeners: Arc<ListenerRegistry>,
    lifecycle: AtomicU8,
    write_lock: Mutex<()>,
}

impl ConfigManager {
    /// Create a manager holding the default document. Call
    /// [`initialize`](Self::initialize) to load persisted overrides.
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self {
            storage,
            document: ArcSwap::from_pointee(ConfigDocument::default()),
            listeners: Arc::new(ListenerRegistry::new()),
            lifecycle: AtomicU8::new(Lifecycle::Uninitialized as u8),
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Arc<StorageService> {
        &self.storage
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    pub fn is_loaded(&self) -> bool {
        self.lifecycle() == Lifecycle::Ready
    }

    /// Load the persisted document and merge it over defaults.
    ///
    /// A second call is a no-op.
    pub async fn initialize(&self) {
        let _guard = self.write_lock.lock().await;
        self.load_locked().await;
    }

    /// Body of `initialize`; the caller holds the write lock.
    async fn load_locked(&self) {
        if self.is_loaded() {
            return;
        }
        self.lifecycle
            .store(Lifecycle::Loading as u8, Ordering::Release);

        let document = match self.storage.get_item(CONFIG_STORAGE_KEY).await {
            Some(stored) => match merge_onto_defaults(stored) {
                Ok(doc) => {
                    let report = validate_config(&doc);
                    if !report.is_valid {
                        warn!(errors = ?report.errors, "Persisted configuration violates rules");
                    }
                    info!("Loaded persisted configuration");
                    doc
                }
                Err(e) => {
                    warn!(error = %e, "Persisted configuration is unreadable, using defaults");
                    ConfigDocument::default()
                }
            },
            None => {
                debug!("No persisted configuration, using defaults");
                ConfigDocument::default()
            }
        };

        self.document.store(Arc::new(document));
        self.lifecycle.store(Lifecycle::Ready as u8, Ordering::Release);
        self.listeners.notify(&ConfigEvent::Initialized);
    }

    /// Current document snapshot.
    pub fn document(&self) -> Arc<ConfigDocument> {
        self.document.load_full()
    }

    /// Current document as JSON.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&**self.document.load()).unwrap_or(Value::Null)
    }

    /// Value at a dotted path, or `None` if any segment is missing.
    /// An empty path yields the whole document.
    pub fn get_value(&self, path: &str) -> Option<Value> {
        path::get(&self.to_value(), path).cloned()
    }

    /// Typed value at a dotted path, falling back to `default` when the path is
    /// missing or holds a different shape.
    pub fn get<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.get_value(path)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(default)
    }

    pub fn category(&self, category: Category) -> Value {
        self.get_value(category.as_str()).unwrap_or(Value::Null)
    }

    /// Set the value at a dotted path.
    ///
    /// Fails with `InvalidConfiguration` if the candidate document does not fit
    /// the schema or violates a rule, or with the storage error if it cannot be
    /// persisted. The live document is unchanged on failure.
    pub async fn set(&self, path: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.load_locked().await;
        self.set_locked(path, value).await
    }

    async fn set_locked(&self, path: &str, value: Value) -> Result<()> {
        let mut candidate = self.to_value();
        let old_value = path::set(&mut candidate, path, value.clone())?;
        let document = parse_candidate(candidate)?;

        self.commit(document).await?;
        debug!(path = %path, "Configuration updated");
        self.listeners.notify(&ConfigEvent::Updated {
            path: path.to_string(),
            value,
            old_value,
        });
        Ok(())
    }

    /// Merge `partial` into one category, keeping keys it does not mention.
    ///
    /// Listeners receive an `Updated` event for the category path carrying the
    /// merged category.
    pub async fn update_category(&self, category: Category, partial: Value) -> Result<()> {
        if !partial.is_object() {
            return Err(Error::invalid(format!(
                "update for category {} must be an object",
                category
            )));
        }
        let _guard = self.write_lock.lock().await;
        self.load_locked().await;
        let merged = deep_merge(self.category(category), partial);
        self.set_locked(category.as_str(), merged).await
    }

    /// Restore the default document.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.load_locked().await;
        self.commit(ConfigDocument::default()).await?;
        info!("Configuration reset to defaults");
        self.listeners.notify(&ConfigEvent::Reset);
        Ok(())
    }

    /// Checksummed copy of the current document.
    pub fn export(&self) -> ConfigExport {
        let config = (*self.document()).clone();
        let checksum = serde_json::to_value(&config)
            .map(|v| checksum(&v))
            .unwrap_or_default();
        ConfigExport {
            config,
            exported_at: chrono::Utc::now().to_rfc3339(),
            version: EXPORT_VERSION.to_string(),
            checksum,
        }
    }

    /// Replace the document with an exported one.
    ///
    /// The payload needs a `config` object. When it carries a `checksum`, the
    /// checksum must be a string and must match one recomputed over `config`.
    pub async fn import(&self, payload: Value) -> Result<()> {
        let Value::Object(mut payload) = payload else {
            return Err(Error::InvalidBackupFormat(
                "export payload must be a JSON object".to_string(),
            ));
        };
        let config = match payload.remove("config") {
            Some(config @ Value::Object(_)) => config,
            Some(_) => {
                return Err(Error::InvalidBackupFormat(
                    "export `config` must be an object".to_string(),
                ));
            }
            None => {
                return Err(Error::InvalidBackupFormat(
                    "export is missing `config`".to_string(),
                ));
            }
        };

        match payload.get("checksum") {
            None => {}
            Some(Value::String(expected)) => {
                let actual = checksum(&config);
                if actual != *expected {
                    return Err(Error::IntegrityCheckFailed {
                        expected: expected.clone(),
                        actual,
                    });
                }
            }
            Some(_) => {
                return Err(Error::InvalidBackupFormat(
                    "export `checksum` must be a string".to_string(),
                ));
            }
        }

        let document = merge_onto_defaults(config)?;

        let _guard = self.write_lock.lock().await;
        self.load_locked().await;
        self.commit(document).await?;
        info!("Configuration imported");
        self.listeners.notify(&ConfigEvent::Imported);
        Ok(())
    }

    /// Parse an export from JSON text and import it.
    pub async fn import_str(&self, json: &str) -> Result<()> {
        let payload: Value = serde_json::from_str(json)
            .map_err(|e| Error::InvalidBackupFormat(format!("not valid JSON: {}", e)))?;
        self.import(payload).await
    }

    /// Register a listener. It stays registered while the guard is alive.
    pub fn add_listener<F>(&self, listener: F) -> ListenerGuard
    where
        F: Fn(&ConfigEvent) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Validate, persist and swap in a document. The caller holds the write lock.
    async fn commit(&self, document: ConfigDocument) -> Result<()> {
        let report = validate_config(&document);
        if !report.is_valid {
            return Err(Error::InvalidConfiguration(report.errors));
        }
        self.storage
            .write_item(CONFIG_STORAGE_KEY, &document)
            .await?;
        self.document.store(Arc::new(document));
        Ok(())
    }
}

/// Lay an override over the default document and parse the result.
fn merge_onto_defaults(overlay: Value) -> Result<ConfigDocument> {
    let defaults = serde_json::to_value(ConfigDocument::default())?;
    parse_candidate(deep_merge(defaults, overlay))
}

fn parse_candidate(candidate: Value) -> Result<ConfigDocument> {
    serde_json::from_value(candidate).map_err(|e| Error::invalid(e.to_string()))
}
