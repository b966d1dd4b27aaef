//! Settings loader with tier-based merging.
//!
//! Loads settings from multiple tiers and merges them field-by-field.

use super::types::Settings;
use crate::config::deep_merge_all;
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Settings tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingsTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level file (`./support-config.yaml`)
    Project = 1,
    /// User-level file (`~/.support-config/settings.yaml`)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for SettingsTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsTier::Defaults => write!(f, "defaults"),
            SettingsTier::Project => write!(f, "project"),
            SettingsTier::User => write!(f, "user"),
            SettingsTier::Environment => write!(f, "environment"),
        }
    }
}

pub const ENV_SETTINGS_PATH: &str = "SUPPORT_CONFIG_SETTINGS_PATH";
pub const ENV_DB_PATH: &str = "SUPPORT_CONFIG_DB_PATH";
pub const ENV_PREFIX: &str = "SUPPORT_CONFIG_PREFIX";
pub const ENV_LOG_LEVEL: &str = "SUPPORT_CONFIG_LOG_LEVEL";

/// Files consulted for each tier.
#[derive(Debug, Clone)]
pub struct SettingsPaths {
    pub project_file: Option<PathBuf>,
    pub user_file: Option<PathBuf>,
}

impl Default for SettingsPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl SettingsPaths {
    pub fn discover() -> Self {
        Self {
            project_file: Some(PathBuf::from("support-config.yaml")),
            user_file: dirs::home_dir().map(|h| h.join(".support-config").join("settings.yaml")),
        }
    }
}

/// Settings loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    settings: Settings,
    /// Files that contributed, lowest tier first.
    sources: Vec<(SettingsTier, PathBuf)>,
}

impl SettingsLoader {
    /// Load settings from all tiers, reading overrides from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(SettingsPaths::discover(), |name| std::env::var(name).ok())
    }

    /// Load settings with explicit paths and an environment lookup.
    pub fn load_with<F>(paths: SettingsPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An explicit file replaces the project and user tiers
        if let Some(explicit) = env(ENV_SETTINGS_PATH) {
            let path = PathBuf::from(explicit);
            let mut settings = Settings::load(&path)?;
            Self::apply_env_overrides(&mut settings, &env);
            return Ok(Self {
                settings,
                sources: vec![(SettingsTier::User, path)],
            });
        }

        let mut layers: Vec<Value> = vec![serde_json::to_value(Settings::default())?];
        let mut sources = Vec::new();

        for (tier, file) in [
            (SettingsTier::Project, paths.project_file.as_deref()),
            (SettingsTier::User, paths.user_file.as_deref()),
        ] {
            let Some(file) = file else { continue };
            if let Some(layer) = read_yaml_layer(file) {
                layers.push(layer);
                sources.push((tier, file.to_path_buf()));
            }
        }

        let mut settings: Settings = serde_json::from_value(deep_merge_all(layers))?;
        Self::apply_env_overrides(&mut settings, &env);

        Ok(Self { settings, sources })
    }

    fn apply_env_overrides<F>(settings: &mut Settings, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = env(ENV_DB_PATH) {
            settings.storage.db_path = PathBuf::from(db_path);
        }
        if let Some(prefix) = env(ENV_PREFIX) {
            settings.storage.prefix = prefix;
        }
        if let Some(level) = env(ENV_LOG_LEVEL) {
            settings.logging.level = level;
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn sources(&self) -> &[(SettingsTier, PathBuf)] {
        &self.sources
    }
}

/// Read a YAML file as a JSON value. Missing files are skipped silently,
/// unparsable ones with a warning.
fn read_yaml_layer(path: &Path) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read settings file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unparsable settings file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_files() {
        let paths = SettingsPaths {
            project_file: None,
            user_file: None,
        };
        let loader = SettingsLoader::load_with(paths, no_env).unwrap();
        assert_eq!(loader.settings().storage.prefix, "@autism_app:");
        assert_eq!(loader.settings().logging.level, "info");
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn test_user_tier_overrides_project_field_by_field() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project.yaml");
        let user = dir.path().join("user.yaml");
        std::fs::write(
            &project,
            "storage:\n  prefix: \"proj:\"\n  soft_limit_bytes: 10\n",
        )
        .unwrap();
        std::fs::write(&user, "storage:\n  prefix: \"user:\"\n").unwrap();

        let loader = SettingsLoader::load_with(
            SettingsPaths {
                project_file: Some(project),
                user_file: Some(user),
            },
            no_env,
        )
        .unwrap();

        assert_eq!(loader.settings().storage.prefix, "user:");
        assert_eq!(loader.settings().storage.soft_limit_bytes, 10);
        assert!(loader.settings().storage.cache_enabled);
        assert_eq!(loader.sources().len(), 2);
        assert_eq!(loader.sources()[0].0, SettingsTier::Project);
    }

    #[test]
    fn test_env_wins_over_files() {
        let dir = TempDir::new().unwrap();
        let user = dir.path().join("user.yaml");
        std::fs::write(&user, "logging:\n  level: warn\n").unwrap();

        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_LOG_LEVEL, "debug"), (ENV_DB_PATH, "/tmp/x.db")]);
        let loader = SettingsLoader::load_with(
            SettingsPaths {
                project_file: None,
                user_file: Some(user),
            },
            |name| env.get(name).map(|v| v.to_string()),
        )
        .unwrap();

        assert_eq!(loader.settings().logging.level, "debug");
        assert_eq!(loader.settings().storage.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_explicit_file_replaces_tiers() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("explicit.yaml");
        let project = dir.path().join("project.yaml");
        std::fs::write(&explicit, "storage:\n  cache_enabled: false\n").unwrap();
        std::fs::write(&project, "storage:\n  prefix: \"proj:\"\n").unwrap();

        let explicit_str = explicit.to_string_lossy().to_string();
        let loader = SettingsLoader::load_with(
            SettingsPaths {
                project_file: Some(project),
                user_file: None,
            },
            |name| (name == ENV_SETTINGS_PATH).then(|| explicit_str.clone()),
        )
        .unwrap();

        assert!(!loader.settings().storage.cache_enabled);
        assert_eq!(loader.settings().storage.prefix, "@autism_app:");
    }

    #[test]
    fn test_unparsable_file_skipped() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project.yaml");
        std::fs::write(&project, "storage: [unclosed").unwrap();

        let loader = SettingsLoader::load_with(
            SettingsPaths {
                project_file: Some(project),
                user_file: None,
            },
            no_env,
        )
        .unwrap();
        assert!(loader.sources().is_empty());
    }
}
