//! The configuration document and its manager.
//!
//! - [`ConfigDocument`]: typed settings with hardcoded defaults, six categories
//!   (`user`, `communication`, `emotional`, `food`, `schedule`, `system`)
//! - [`ConfigManager`]: dotted-path get/set, validation, persistence through
//!   [`StorageService`](crate::storage::StorageService), listeners, reset,
//!   checksummed export/import
//!
//! ## Merge Strategy
//! Persisted and imported documents are deep-merged over defaults: objects key by
//! key, arrays and primitives replaced wholesale, `null` keeps the default.

mod checksum;
mod document;
mod events;
mod manager;
mod merge;
pub mod path;
mod validate;

pub use checksum::checksum;
pub use document::*;
pub use events::{ConfigEvent, Listener, ListenerGuard};
pub use manager::{CONFIG_STORAGE_KEY, ConfigExport, ConfigManager, EXPORT_VERSION, Lifecycle};
pub use merge::{deep_merge, deep_merge_all};
pub use validate::{MIN_DAILY_STARS, MIN_WAIT_TIME, ValidationReport, validate_config};
