//! User-facing alert configuration.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::threshold_validation::validate_positive_at_most;

/// Default temperature alert threshold in °C.
pub const DEFAULT_TEMPERATURE_THRESHOLD: f64 = 70.0;

/// Default hashrate drop (percent below baseline) that triggers an alert.
pub const DEFAULT_HASHRATE_DROP_PERCENT: f64 = 20.0;

/// Upper bound accepted for the temperature threshold.
const MAX_TEMPERATURE_THRESHOLD: f64 = 150.0;

/// Process-wide alert settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Master switch. When off, no alert fires but state keeps updating.
    pub notifications_enabled: bool,
    pub offline_enabled: bool,
    pub temperature_enabled: bool,
    pub hashrate_enabled: bool,
    /// Temperature in °C at or above which an alert fires.
    pub temperature_threshold: f64,
    /// Percent below baseline at or beyond which an alert fires.
    pub hashrate_drop_percent: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            offline_enabled: true,
            temperature_enabled: true,
            hashrate_enabled: true,
            temperature_threshold: DEFAULT_TEMPERATURE_THRESHOLD,
            hashrate_drop_percent: DEFAULT_HASHRATE_DROP_PERCENT,
        }
    }
}

impl AlertConfig {
    /// Check that both numeric thresholds are within their accepted ranges.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_positive_at_most(
            self.temperature_threshold,
            MAX_TEMPERATURE_THRESHOLD,
            "temperature_threshold",
        )?;
        validate_positive_at_most(self.hashrate_drop_percent, 100.0, "hashrate_drop_percent")?;
        Ok(())
    }

    /// Return a copy with every field present in `update` replaced.
    ///
    /// The result is validated; `self` is never modified.
    pub fn merged(&self, update: &AlertConfigUpdate) -> Result<AlertConfig, CoreError> {
        let merged = AlertConfig {
            notifications_enabled: update
                .notifications_enabled
                .unwrap_or(self.notifications_enabled),
            offline_enabled: update.offline_enabled.unwrap_or(self.offline_enabled),
            temperature_enabled: update.temperature_enabled.unwrap_or(self.temperature_enabled),
            hashrate_enabled: update.hashrate_enabled.unwrap_or(self.hashrate_enabled),
            temperature_threshold: update
                .temperature_threshold
                .unwrap_or(self.temperature_threshold),
            hashrate_drop_percent: update
                .hashrate_drop_percent
                .unwrap_or(self.hashrate_drop_percent),
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// Partial update for [`AlertConfig`]. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertConfigUpdate {
    pub notifications_enabled: Option<bool>,
    pub offline_enabled: Option<bool>,
    pub temperature_enabled: Option<bool>,
    pub hashrate_enabled: Option<bool>,
    pub temperature_threshold: Option<f64>,
    pub hashrate_drop_percent: Option<f64>,
}
