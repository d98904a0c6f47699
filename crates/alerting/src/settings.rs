//! Persistence boundary for [`AlertConfig`].
//!
//! The real key-value settings store lives outside this crate; it plugs in
//! through [`SettingsStore`]. Two stores ship here: an in-memory one and a
//! JSON file used by the daemon.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rigwatch_core::hardware::config::AlertConfig;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings are not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    /// Failure reported by an external store implementation.
    #[error("Settings backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The stored config, or `None` if nothing was ever saved.
    async fn load_alert_config(&self) -> Result<Option<AlertConfig>, SettingsError>;

    async fn save_alert_config(&self, config: &AlertConfig) -> Result<(), SettingsError>;
}

// ---------------------------------------------------------------------------
// MemorySettingsStore
// ---------------------------------------------------------------------------

/// Keeps the config in process memory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    config: Mutex<Option<AlertConfig>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AlertConfig) -> Self {
        Self {
            config: Mutex::new(Some(config)),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load_alert_config(&self) -> Result<Option<AlertConfig>, SettingsError> {
        Ok(self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save_alert_config(&self, config: &AlertConfig) -> Result<(), SettingsError> {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileSettingsStore
// ---------------------------------------------------------------------------

/// Stores the config as a JSON document on disk.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn load_alert_config(&self) -> Result<Option<AlertConfig>, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_alert_config(&self, config: &AlertConfig) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemorySettingsStore::new();
        assert!(store.load_alert_config().await.unwrap().is_none());

        let config = AlertConfig {
            temperature_threshold: 75.0,
            ..Default::default()
        };
        store.save_alert_config(&config).await.unwrap();
        assert_eq!(store.load_alert_config().await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn json_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSettingsStore::new(dir.path().join("settings.json"));
        assert!(store.load_alert_config().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_store_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = JsonFileSettingsStore::new(&path);

        let config = AlertConfig {
            hashrate_enabled: false,
            hashrate_drop_percent: 35.0,
            ..Default::default()
        };
        store.save_alert_config(&config).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileSettingsStore::new(&path);
        assert_eq!(reopened.load_alert_config().await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn json_store_rejects_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = JsonFileSettingsStore::new(&path);
        assert_matches!(store.load_alert_config().await, Err(SettingsError::Serde(_)));
    }
}
