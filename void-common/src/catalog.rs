// void-common/src/catalog.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, VoidError};
use crate::model::app::{AppOverride, AppRecord};

const BUILTIN_APPS: &str = include_str!("builtin_apps.json");

/// Immutable table of installable apps, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    apps: BTreeMap<String, AppRecord>,
}

impl Catalog {
    /// The built-in app table merged with the user's `custom_apps.json`, if any.
    pub fn load(config: &Config) -> Result<Self> {
        let mut catalog = Self::builtin()?;
        let custom_path = config.custom_apps_file();
        if custom_path.is_file() {
            match catalog.merge_overrides_from(&custom_path) {
                Ok(count) => debug!(
                    "Merged {} custom app definitions from {}",
                    count,
                    custom_path.display()
                ),
                Err(e) => warn!(
                    "Failed to load custom apps from {}: {}",
                    custom_path.display(),
                    e
                ),
            }
        }
        Ok(catalog)
    }

    pub fn builtin() -> Result<Self> {
        let raw: BTreeMap<String, AppRecord> = serde_json::from_str(BUILTIN_APPS)
            .map_err(|e| VoidError::Config(format!("Built-in app table is invalid: {e}")))?;
        Ok(Self::from_records(raw.into_iter().map(|(key, mut app)| {
            app.key = key;
            app
        })))
    }

    pub fn from_records<I: IntoIterator<Item = AppRecord>>(records: I) -> Self {
        let apps = records
            .into_iter()
            .map(|app| (app.key.clone(), app))
            .collect();
        Self { apps }
    }

    fn merge_overrides_from(&mut self, path: &Path) -> Result<usize> {
        let raw = fs::read_to_string(path)?;
        let overrides: BTreeMap<String, AppOverride> = serde_json::from_str(&raw)?;
        Ok(self.merge_overrides(overrides))
    }

    /// Patches existing entries field by field; unknown keys become new entries.
    pub fn merge_overrides(&mut self, overrides: BTreeMap<String, AppOverride>) -> usize {
        let mut merged = 0;
        for (key, patch) in overrides {
            if let Some(existing) = self.apps.get_mut(&key) {
                patch.apply_to(existing);
                merged += 1;
            } else if let Some(record) = patch.into_record(&key) {
                self.apps.insert(key, record);
                merged += 1;
            } else {
                warn!(
                    "Skipping custom app '{}': new entries need at least 'url' and 'link_name'",
                    key
                );
            }
        }
        merged
    }

    pub fn get(&self, key: &str) -> Option<&AppRecord> {
        self.apps.get(key)
    }

    pub fn require(&self, key: &str) -> Result<&AppRecord> {
        self.get(key).ok_or_else(|| {
            VoidError::NotFound(format!(
                "Application '{key}' is not in the catalog (use 'void list')"
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppRecord> {
        self.apps.values()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
