//! Device alert types emitted by the evaluator.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// The closed set of conditions a device can alert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// The device was online on the previous reading and is now offline.
    Offline,
    /// The device temperature reached the configured threshold.
    Temperature,
    /// The hashrate fell below the adaptive baseline by the configured percentage.
    HashrateDrop,
}

impl AlertType {
    /// Every alert type, in evaluation order.
    pub const ALL: [AlertType; 3] = [
        AlertType::Offline,
        AlertType::Temperature,
        AlertType::HashrateDrop,
    ];

    /// Human-readable notification title.
    pub fn title(self) -> &'static str {
        match self {
            AlertType::Offline => "Device Offline",
            AlertType::Temperature => "High Temperature",
            AlertType::HashrateDrop => "Hashrate Drop",
        }
    }

    /// Dot-separated event name used on the event bus.
    pub fn event_name(self) -> &'static str {
        match self {
            AlertType::Offline => "alert.offline",
            AlertType::Temperature => "alert.temperature",
            AlertType::HashrateDrop => "alert.hashrate_drop",
        }
    }
}

/// A single fired alert, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotification {
    pub alert_type: AlertType,
    pub device_id: DbId,
    pub device_name: String,
    /// Short title, see [`AlertType::title`].
    pub title: String,
    /// Body text shown to the user. Always mentions the device name.
    pub message: String,
    /// Observed value that triggered the alert (°C or drop percentage).
    pub value: Option<f64>,
    /// Configured limit the value was compared against.
    pub threshold: Option<f64>,
    pub timestamp: Timestamp,
}
