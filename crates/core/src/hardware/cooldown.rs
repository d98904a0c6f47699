//! Per-device alert suppression.

use std::time::Duration;

use crate::alert::AlertType;
use crate::types::Timestamp;

/// Minimum interval between repeated alerts of the same type for one device.
pub const ALERT_COOLDOWN: Duration = Duration::from_secs(300); // 5 minutes

/// Last-fired timestamps, one slot per alert type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertCooldowns {
    offline: Option<Timestamp>,
    temperature: Option<Timestamp>,
    hashrate_drop: Option<Timestamp>,
}

impl AlertCooldowns {
    fn slot(&self, alert_type: AlertType) -> Option<Timestamp> {
        match alert_type {
            AlertType::Offline => self.offline,
            AlertType::Temperature => self.temperature,
            AlertType::HashrateDrop => self.hashrate_drop,
        }
    }

    fn slot_mut(&mut self, alert_type: AlertType) -> &mut Option<Timestamp> {
        match alert_type {
            AlertType::Offline => &mut self.offline,
            AlertType::Temperature => &mut self.temperature,
            AlertType::HashrateDrop => &mut self.hashrate_drop,
        }
    }

    /// When `alert_type` last fired, if ever.
    pub fn last_fired(&self, alert_type: AlertType) -> Option<Timestamp> {
        self.slot(alert_type)
    }

    /// Whether `alert_type` may fire at `now`. Never-fired counts as elapsed.
    pub fn is_elapsed(&self, alert_type: AlertType, now: Timestamp) -> bool {
        match self.slot(alert_type) {
            Some(last) => match (now - last).to_std() {
                Ok(elapsed) => elapsed >= ALERT_COOLDOWN,
                // `now` before the recorded time (clock stepped back).
                Err(_) => false,
            },
            None => true,
        }
    }

    /// Record that `alert_type` fired at `now`.
    pub fn record(&mut self, alert_type: AlertType, now: Timestamp) {
        *self.slot_mut(alert_type) = Some(now);
    }
}
