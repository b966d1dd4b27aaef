//! Runtime settings for the storage backend and logging.
//!
//! Settings come from four tiers merged field by field:
//! 1. **Defaults** - embedded
//! 2. **Project** - `./support-config.yaml`
//! 3. **User** - `~/.support-config/settings.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `SUPPORT_CONFIG_SETTINGS_PATH` - Explicit settings file (replaces tiers 2 and 3)
//! - `SUPPORT_CONFIG_DB_PATH` - Database path
//! - `SUPPORT_CONFIG_PREFIX` - Storage key prefix
//! - `SUPPORT_CONFIG_LOG_LEVEL` - Default log filter

mod loader;
mod types;

pub use loader::{
    ENV_DB_PATH, ENV_LOG_LEVEL, ENV_PREFIX, ENV_SETTINGS_PATH, SettingsLoader, SettingsPaths,
    SettingsTier,
};
pub use types::*;
