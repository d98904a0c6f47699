//! The alerting facade owned by the process.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use rigwatch_core::hardware::config::{AlertConfig, AlertConfigUpdate};
use rigwatch_core::hardware::evaluator::{AlertEvaluator, DeviceReading};
use rigwatch_core::types::{DbId, Timestamp};
use rigwatch_events::NotificationDispatcher;

use crate::error::AlertingError;
use crate::settings::SettingsStore;

/// Owns the evaluator, the active config and the dispatch capability.
///
/// One instance per process, shared as `Arc<AlertingService>`. The std locks
/// are held only for in-memory work; only `update_lock` spans an `.await`.
pub struct AlertingService {
    evaluator: Mutex<AlertEvaluator>,
    config: RwLock<AlertConfig>,
    settings: Arc<dyn SettingsStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    /// Serialises `save_config` from merge to swap.
    update_lock: tokio::sync::Mutex<()>,
}

impl AlertingService {
    /// Build the service, loading the config from `settings`.
    ///
    /// A missing or unreadable config falls back to the defaults; alerting
    /// must come up even when the settings store does not.
    pub async fn new(
        settings: Arc<dyn SettingsStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let config = match settings.load_alert_config().await {
            Ok(Some(config)) => match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored alert config is invalid, using defaults");
                    AlertConfig::default()
                }
            },
            Ok(None) => {
                tracing::info!("No stored alert config, using defaults");
                AlertConfig::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load alert config, using defaults");
                AlertConfig::default()
            }
        };
        Self::with_config(config, settings, dispatcher)
    }

    /// Build the service with an explicit starting config.
    pub fn with_config(
        config: AlertConfig,
        settings: Arc<dyn SettingsStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            evaluator: Mutex::new(AlertEvaluator::new()),
            config: RwLock::new(config),
            settings,
            dispatcher,
            update_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Ingest one fresh reading and dispatch whatever alerts it fires.
    pub fn on_fresh_reading(&self, reading: &DeviceReading) {
        self.on_fresh_reading_at(reading, chrono::Utc::now());
    }

    /// [`on_fresh_reading`](Self::on_fresh_reading) as of `now`.
    pub fn on_fresh_reading_at(&self, reading: &DeviceReading, now: Timestamp) {
        let config = self.config();
        let alerts = self.evaluator().evaluate_at(reading, &config, now);

        for alert in &alerts {
            tracing::info!(
                device_id = alert.device_id,
                device_name = %alert.device_name,
                alert_type = ?alert.alert_type,
                value = ?alert.value,
                threshold = ?alert.threshold,
                "Alert fired"
            );
            self.dispatcher.dispatch(alert);
        }
    }

    /// Forget a deleted device. Safe to call for unknown ids.
    pub fn clear_device_state(&self, device_id: DbId) {
        if self.evaluator().clear(device_id) {
            tracing::debug!(device_id, "Cleared device alert state");
        }
    }

    /// Snapshot of the active config.
    pub fn config(&self) -> AlertConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a partial update, persist it, then make it active.
    ///
    /// Invalid values or a persistence failure leave the active config as it was.
    /// Concurrent updates are applied one after another, each merging onto the
    /// result of the previous one.
    pub async fn save_config(&self, update: AlertConfigUpdate) -> Result<AlertConfig, AlertingError> {
        let _guard = self.update_lock.lock().await;
        let merged = self.config().merged(&update)?;
        self.settings.save_alert_config(&merged).await?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = merged.clone();
        tracing::info!(?merged, "Alert config updated");
        Ok(merged)
    }

    /// Number of devices with tracked alert state.
    pub fn tracked_devices(&self) -> usize {
        self.evaluator().device_count()
    }

    fn evaluator(&self) -> MutexGuard<'_, AlertEvaluator> {
        self.evaluator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
