//! Configuration file for synchronization runs

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tipsync_catalog::{CatalogFormat, DriftReport, KeyOrder};
use tipsync_schema::ProjectSettings;
use tracing::debug;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "tipsync.yaml";

/// When a `check` run counts as failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPolicy {
    /// Fail only when live fields or types have no catalog entry
    #[default]
    Standard,
    /// Also fail on stale entries and on blank help texts
    Strict,
}

impl CheckPolicy {
    pub fn fails(&self, drift: &DriftReport) -> bool {
        match self {
            Self::Standard => drift.has_missing(),
            Self::Strict => drift.has_missing() || drift.has_stale() || drift.has_blank(),
        }
    }
}

/// Settings of a synchronization run, as read from `tipsync.yaml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Persisted catalog, relative to the configuration file
    pub catalog: Option<PathBuf>,
    /// Registry definition, relative to the configuration file
    pub registry: Option<PathBuf>,
    /// Catalog format; derived from the catalog extension when absent
    pub format: Option<CatalogFormat>,
    /// Name the catalog literal is bound to when written
    pub binding: Option<String>,
    /// Spaces per nesting level in the literal notation
    pub indent: Option<usize>,
    pub ordering: KeyOrder,
    pub policy: CheckPolicy,
    /// Ambient project settings handed to the element models
    settings: IndexMap<String, serde_yaml::Value>,
}

impl SyncConfig {
    /// Load a configuration file, resolving its paths against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("invalid configuration {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.catalog = config.catalog.map(|p| base.join(p));
            config.registry = config.registry.map(|p| base.join(p));
        }
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load the explicit configuration, or `tipsync.yaml` from the working
    /// directory when it exists, or fall back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Project settings with every scalar value rendered as text
    pub fn project_settings(&self) -> Result<ProjectSettings> {
        let mut settings = ProjectSettings::new();
        for (key, value) in &self.settings {
            let text = match value {
                serde_yaml::Value::String(s) => s.clone(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => bail!("project setting '{key}' must be a scalar value"),
            };
            settings.set(key.clone(), text);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipsync_catalog::{Catalog, diff};
    use tipsync_schema::Schema;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.policy, CheckPolicy::Standard);
        assert_eq!(config.ordering, KeyOrder::Insertion);
        assert!(config.catalog.is_none());
        assert!(config.project_settings().unwrap().is_empty());
    }

    #[test]
    fn test_from_yaml() {
        let config = SyncConfig::from_yaml(
            "catalog: data/tooltips.catalog\nformat: literal\nbinding: tooltips\nordering: lexicographic\npolicy: strict\nsettings:\n  frequency: 50\n  thermal: true\n  project: North grid\n",
        )
        .unwrap();

        assert_eq!(config.format, Some(CatalogFormat::Literal));
        assert_eq!(config.ordering, KeyOrder::Lexicographic);
        assert_eq!(config.policy, CheckPolicy::Strict);

        let settings = config.project_settings().unwrap();
        assert_eq!(settings.get("frequency"), Some("50"));
        assert!(settings.flag("thermal"));
        assert_eq!(settings.get("project"), Some("North grid"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(SyncConfig::from_yaml("catalgo: x\n").is_err());
    }

    #[test]
    fn test_nested_setting_is_rejected() {
        let config = SyncConfig::from_yaml("settings:\n  frequency: [50, 60]\n").unwrap();
        assert!(config.project_settings().is_err());
    }

    #[test]
    fn test_policies() {
        let schema = Schema::new().with_type("fuse", ["In"]);
        let blank = Catalog::new().with_type("fuse", [("In", "")]);
        let missing = Catalog::new();

        assert!(!CheckPolicy::Standard.fails(&diff(&blank, &schema)));
        assert!(CheckPolicy::Strict.fails(&diff(&blank, &schema)));
        assert!(CheckPolicy::Standard.fails(&diff(&missing, &schema)));
    }
}
