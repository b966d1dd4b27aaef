//! Change listeners for the config manager.
//!
//! Listeners are plain callbacks. They are invoked synchronously after each
//! successful mutation, in registration order, outside the registry lock. A
//! listener that panics is logged and skipped; the remaining listeners still
//! run.

use serde::Serialize;
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::warn;

/// Notification sent to listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ConfigEvent {
    /// The persisted document was loaded (or defaults were adopted).
    Initialized,
    /// A path was changed by `set` or `update_category`.
    #[serde(rename_all = "camelCase")]
    Updated {
        path: String,
        value: Value,
        old_value: Option<Value>,
    },
    /// The document was restored to defaults.
    Reset,
    /// A document was imported from an export payload.
    Imported,
}

impl ConfigEvent {
    /// Event name, as seen by UI code.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigEvent::Initialized => "initialized",
            ConfigEvent::Updated { .. } => "updated",
            ConfigEvent::Reset => "reset",
            ConfigEvent::Imported => "imported",
        }
    }
}

pub type Listener = Arc<dyn Fn(&ConfigEvent) + Send + Sync>;

/// Registered listeners, keyed by a monotonically increasing id.
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn add(self: &Arc<Self>, listener: Listener) -> ListenerGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners().push((id, listener));
        ListenerGuard {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove a listener. Returns `true` if it was registered.
    fn remove(&self, id: u64) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners().len()
    }

    pub(crate) fn notify(&self, event: &ConfigEvent) {
        // Snapshot so listeners may subscribe or unsubscribe while being called.
        let snapshot: Vec<(u64, Listener)> = self.listeners().clone();
        for (id, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(listener = id, event = event.name(), "Config listener panicked");
            }
        }
    }
}

/// Subscription handle returned by `add_listener`.
///
/// Dropping the guard unsubscribes the listener.
#[must_use = "dropping the guard immediately unsubscribes the listener"]
pub struct ListenerGuard {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl ListenerGuard {
    /// Unsubscribe now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (
            count,
            Arc::new(move |_: &ConfigEvent| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    fn failing_listener(_: &ConfigEvent) {
        panic!("listener failure");
    }

    #[test]
    fn test_guard_drop_unsubscribes() {
        let registry = Arc::new(ListenerRegistry::new());
        let (count, listener) = counter();

        let guard = registry.add(listener);
        assert_eq!(registry.len(), 1);
        registry.notify(&ConfigEvent::Reset);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        guard.unsubscribe();
        assert_eq!(registry.len(), 0);
        registry.notify(&ConfigEvent::Reset);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let registry = Arc::new(ListenerRegistry::new());
        let _bad = registry.add(Arc::new(failing_listener));
        let (count, listener) = counter();
        let _good = registry.add(listener);

        registry.notify(&ConfigEvent::Imported);
        registry.notify(&ConfigEvent::Imported);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_guard_outliving_registry() {
        let registry = Arc::new(ListenerRegistry::new());
        let (_count, listener) = counter();
        let guard = registry.add(listener);
        drop(registry);
        // Nothing to unsubscribe from; must not panic
        drop(guard);
    }

    #[test]
    fn test_event_serialization() {
        let event = ConfigEvent::Updated {
            path: "user.name".into(),
            value: "Ana".into(),
            old_value: Some("Damián".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "updated");
        assert_eq!(json["oldValue"], "Damián");
        assert_eq!(event.name(), "updated");
    }
}
