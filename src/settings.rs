use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard},
};

use crate::api::ApiEndpoints;
use crate::chat::format::PriceDefaults;
use crate::language::Language;
use crate::log_warn;

const ENABLE_LOGS: bool = true;

/// Overrides `api.base_url` when set, e.g. to point a dev build at a local server.
pub const API_URL_ENV: &str = "SMART_MUSA_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub api: ApiEndpoints,
    /// Chatbot language name, e.g. `english`.
    pub language: String,
    pub price_defaults: PriceDefaults,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            api: ApiEndpoints::default(),
            language: Language::default().as_str().to_string(),
            price_defaults: PriceDefaults::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("Ignoring unreadable settings file {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        if let Ok(base_url) = env::var(API_URL_ENV) {
            if !base_url.trim().is_empty() {
                data.api.base_url = base_url.trim().to_string();
            }
        }

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> UserSettings {
        self.read().clone()
    }

    pub fn api(&self) -> ApiEndpoints {
        self.read().api.clone()
    }

    pub fn language(&self) -> String {
        self.read().language.clone()
    }

    pub fn price_defaults(&self) -> PriceDefaults {
        self.read().price_defaults.clone()
    }

    /// Replaces the stored settings and writes them to disk.
    pub fn update(&self, settings: UserSettings) -> Result<()> {
        if settings.api.base_url.trim().is_empty() {
            return Err(anyhow!("API base URL must not be empty"));
        }
        if settings.api.timeout_secs == 0 {
            return Err(anyhow!("API timeout must be at least one second"));
        }

        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.get();
        assert_eq!(settings.language, "english");
        assert_eq!(settings.price_defaults.location, "Colombo");
        assert_eq!(settings.api.timeout_secs, 30);
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.get();
        settings.language = "sinhala".into();
        settings.price_defaults.quantity = 10;
        store.update(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.language(), "sinhala");
        assert_eq!(reloaded.price_defaults().quantity, 10);
    }

    #[test]
    fn rejects_invalid_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let mut settings = store.get();
        settings.api.timeout_secs = 0;
        assert!(store.update(settings).is_err());
        assert_eq!(store.api().timeout_secs, 30);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.get(), UserSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"language":"sinhala"}"#).unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.language(), "sinhala");
        assert_eq!(store.price_defaults(), PriceDefaults::default());
    }
}
