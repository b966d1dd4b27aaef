//! Reactive binding of a config path to UI state.
//!
//! A [`ConfigBinding`] subscribes to the manager when created and unsubscribes
//! when dropped. On every notification it re-reads its path and publishes the
//! value through a tokio watch channel, but only if the value actually changed,
//! so a view awaiting [`ConfigBinding::changed`] re-renders exactly when its
//! data differs.

use crate::config::{Category, ConfigExport, ConfigManager, ListenerGuard};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// Live view of one path (or the whole document) plus bound accessors.
pub struct ConfigBinding {
    manager: Arc<ConfigManager>,
    path: Option<String>,
    rx: watch::Receiver<Value>,
    _guard: ListenerGuard,
}

impl ConfigBinding {
    /// Bind to `path`, or to the whole document when `path` is `None`.
    pub fn new(manager: Arc<ConfigManager>, path: Option<&str>) -> Self {
        let path = path.map(str::to_string);
        let (tx, rx) = watch::channel(read(&manager, path.as_deref()));

        // The listener lives inside the manager, so it must not keep it alive.
        let weak: Weak<ConfigManager> = Arc::downgrade(&manager);
        let bound = path.clone();
        let guard = manager.add_listener(move |_event| {
            let Some(manager) = weak.upgrade() else {
                return;
            };
            let next = read(&manager, bound.as_deref());
            tx.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
        });

        Self {
            manager,
            path,
            rx,
            _guard: guard,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Current bound value. `Null` when the path is absent.
    pub fn value(&self) -> Value {
        self.rx.borrow().clone()
    }

    /// Current bound value deserialized, or `default` if it does not fit.
    pub fn value_as<T: DeserializeOwned>(&self, default: T) -> T {
        serde_json::from_value(self.value()).unwrap_or(default)
    }

    /// Wait until the bound value changes and return it.
    pub async fn changed(&mut self) -> Value {
        // The sender lives as long as our listener guard, which lives as long as self.
        if self.rx.changed().await.is_err() {
            return self.value();
        }
        self.rx.borrow_and_update().clone()
    }

    /// Whether a change is pending that `changed` would return immediately.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn is_loaded(&self) -> bool {
        self.manager.is_loaded()
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.manager.get(path, default)
    }

    pub async fn set(&self, path: &str, value: Value) -> Result<()> {
        self.manager.set(path, value).await
    }

    /// Set the bound path. With no bound path this imports `value` as a whole
    /// document.
    pub async fn set_value(&self, value: Value) -> Result<()> {
        match &self.path {
            Some(path) => self.manager.set(path, value).await,
            None => {
                self.manager
                    .import(serde_json::json!({ "config": value }))
                    .await
            }
        }
    }

    pub async fn update_category(&self, category: Category, partial: Value) -> Result<()> {
        self.manager.update_category(category, partial).await
    }

    pub fn export(&self) -> ConfigExport {
        self.manager.export()
    }

    pub async fn import(&self, payload: Value) -> Result<()> {
        self.manager.import(payload).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.manager.reset().await
    }
}

fn read(manager: &ConfigManager, path: Option<&str>) -> Value {
    manager.get_value(path.unwrap_or("")).unwrap_or(Value::Null)
}
