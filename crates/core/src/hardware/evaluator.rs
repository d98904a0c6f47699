//! Alert evaluation engine for device readings.
//!
//! Pure logic, no I/O. The caller hands in one fresh reading plus the
//! active [`AlertConfig`] and dispatches whatever alerts come back.

use std::collections::HashMap;

use chrono::Utc;

use crate::alert::{AlertNotification, AlertType};
use crate::hardware::config::AlertConfig;
use crate::hardware::state::DeviceAlertState;
use crate::types::{DbId, Timestamp};

/// One poll result for a device, as produced by the polling transport.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    pub device_id: DbId,
    pub device_name: String,
    pub is_online: bool,
    pub hashrate: f64,
    /// Degrees Celsius. Zero or negative means the device did not report one.
    pub temperature: f64,
}

/// Owns the alert state of every known device.
///
/// State is created lazily on a device's first reading and dropped by
/// [`clear`](AlertEvaluator::clear).
#[derive(Debug, Default)]
pub struct AlertEvaluator {
    devices: HashMap<DbId, DeviceAlertState>,
}

impl AlertEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate a reading at the current wall-clock time.
    pub fn evaluate(&mut self, reading: &DeviceReading, config: &AlertConfig) -> Vec<AlertNotification> {
        self.evaluate_at(reading, config, Utc::now())
    }

    /// Evaluate a reading as of `now` and return the alerts that fire.
    ///
    /// The first reading for a device only records state. Condition checks
    /// use the baseline as it was before this reading; the baseline is
    /// folded forward afterwards.
    pub fn evaluate_at(
        &mut self,
        reading: &DeviceReading,
        config: &AlertConfig,
        now: Timestamp,
    ) -> Vec<AlertNotification> {
        let Some(state) = self.devices.get_mut(&reading.device_id) else {
            self.devices.insert(
                reading.device_id,
                DeviceAlertState::initial(
                    reading.device_id,
                    reading.is_online,
                    reading.hashrate,
                    reading.temperature,
                ),
            );
            return Vec::new();
        };

        let mut alerts = Vec::new();

        if config.notifications_enabled {
            check_offline(state, reading, config, now, &mut alerts);
            check_temperature(state, reading, config, now, &mut alerts);
            check_hashrate_drop(state, reading, config, now, &mut alerts);
        }

        if reading.is_online {
            state.hashrate_baseline.update(reading.hashrate);
        }
        state.observe(reading.is_online, reading.hashrate, reading.temperature);

        alerts
    }

    /// Forget a device. Returns whether any state existed.
    pub fn clear(&mut self, device_id: DbId) -> bool {
        self.devices.remove(&device_id).is_some()
    }

    pub fn state(&self, device_id: DbId) -> Option<&DeviceAlertState> {
        self.devices.get(&device_id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

fn check_offline(
    state: &mut DeviceAlertState,
    reading: &DeviceReading,
    config: &AlertConfig,
    now: Timestamp,
    alerts: &mut Vec<AlertNotification>,
) {
    if !config.offline_enabled || !state.last_online || reading.is_online {
        return;
    }
    let message = format!("{} stopped responding and is now offline", reading.device_name);
    fire(state, reading, AlertType::Offline, message, None, None, now, alerts);
}

fn check_temperature(
    state: &mut DeviceAlertState,
    reading: &DeviceReading,
    config: &AlertConfig,
    now: Timestamp,
    alerts: &mut Vec<AlertNotification>,
) {
    let temp = reading.temperature;
    if !config.temperature_enabled || !reading.is_online {
        return;
    }
    // Non-finite values fail every comparison below, so reject them first.
    if !temp.is_finite() || temp <= 0.0 || temp < config.temperature_threshold {
        return;
    }
    let message = format!(
        "{} is running at {:.1}°C (threshold {:.1}°C)",
        reading.device_name, temp, config.temperature_threshold
    );
    fire(
        state,
        reading,
        AlertType::Temperature,
        message,
        Some(temp),
        Some(config.temperature_threshold),
        now,
        alerts,
    );
}

fn check_hashrate_drop(
    state: &mut DeviceAlertState,
    reading: &DeviceReading,
    config: &AlertConfig,
    now: Timestamp,
    alerts: &mut Vec<AlertNotification>,
) {
    if !config.hashrate_enabled || !reading.is_online {
        return;
    }
    if !reading.hashrate.is_finite() || reading.hashrate <= 0.0 {
        return;
    }
    let baseline = state.hashrate_baseline;
    let Some(drop) = baseline.drop_percent(reading.hashrate) else {
        return;
    };
    if !drop.is_finite() || drop < config.hashrate_drop_percent {
        return;
    }
    let message = format!(
        "{} hashrate dropped {:.1}% below its baseline ({:.2} vs {:.2})",
        reading.device_name,
        drop,
        reading.hashrate,
        baseline.value()
    );
    fire(
        state,
        reading,
        AlertType::HashrateDrop,
        message,
        Some(drop),
        Some(config.hashrate_drop_percent),
        now,
        alerts,
    );
}

/// Push an alert unless its cooldown is still running, and restart the cooldown.
#[allow(clippy::too_many_arguments)]
fn fire(
    state: &mut DeviceAlertState,
    reading: &DeviceReading,
    alert_type: AlertType,
    message: String,
    value: Option<f64>,
    threshold: Option<f64>,
    now: Timestamp,
    alerts: &mut Vec<AlertNotification>,
) {
    if !state.cooldowns.is_elapsed(alert_type, now) {
        return;
    }
    state.cooldowns.record(alert_type, now);

    alerts.push(AlertNotification {
        alert_type,
        device_id: reading.device_id,
        device_name: reading.device_name.clone(),
        title: alert_type.title().to_string(),
        message,
        value,
        threshold,
        timestamp: now,
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(online: bool, hashrate: f64, temperature: f64) -> DeviceReading {
        DeviceReading {
            device_id: 1,
            device_name: "rig-alpha".to_string(),
            is_online: online,
            hashrate,
            temperature,
        }
    }

    #[test]
    fn first_reading_never_alerts() {
        let mut ev = AlertEvaluator::new();
        let alerts = ev.evaluate_at(&reading(false, 0.0, 99.0), &AlertConfig::default(), Utc::now());
        assert!(alerts.is_empty());
        assert_eq!(ev.device_count(), 1);
    }

    #[test]
    fn offline_transition_fires_once() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);

        let alerts = ev.evaluate_at(&reading(false, 0.0, 0.0), &cfg, t0 + Duration::seconds(5));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Offline);
        assert_eq!(alerts[0].title, "Device Offline");
        assert!(alerts[0].message.contains("rig-alpha"));
    }

    #[test]
    fn staying_offline_does_not_realert() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        ev.evaluate_at(&reading(false, 0.0, 0.0), &cfg, t0);
        // last_online is now false, so the transition condition is not met.
        let alerts = ev.evaluate_at(&reading(false, 0.0, 0.0), &cfg, t0 + Duration::minutes(10));
        assert!(alerts.is_empty());
    }

    #[test]
    fn offline_disabled_suppresses_alert() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig {
            offline_enabled: false,
            ..Default::default()
        };
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        assert!(ev.evaluate_at(&reading(false, 0.0, 0.0), &cfg, t0).is_empty());
    }

    #[test]
    fn temperature_at_threshold_fires() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        let alerts = ev.evaluate_at(&reading(true, 100.0, 70.0), &cfg, t0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Temperature);
        assert_eq!(alerts[0].value, Some(70.0));
        assert_eq!(alerts[0].threshold, Some(70.0));
    }

    #[test]
    fn temperature_ignored_when_offline_or_unreported() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig {
            offline_enabled: false,
            ..Default::default()
        };
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        assert!(ev.evaluate_at(&reading(false, 0.0, 90.0), &cfg, t0).is_empty());
        assert!(ev.evaluate_at(&reading(true, 100.0, 0.0), &cfg, t0).is_empty());
    }

    #[test]
    fn hashrate_drop_uses_pre_update_baseline() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);

        // 80 is exactly 20% below 100.
        let alerts = ev.evaluate_at(&reading(true, 80.0, 50.0), &cfg, t0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HashrateDrop);
        assert_eq!(alerts[0].value, Some(20.0));

        let baseline = ev.state(1).unwrap().hashrate_baseline.value();
        assert!((baseline - 99.0).abs() < 1e-9);
    }

    #[test]
    fn small_drop_does_not_fire() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        assert!(ev.evaluate_at(&reading(true, 85.0, 50.0), &cfg, t0).is_empty());
    }

    #[test]
    fn offline_reading_does_not_move_baseline() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        ev.evaluate_at(&reading(false, 10.0, 0.0), &cfg, t0);
        assert_eq!(ev.state(1).unwrap().hashrate_baseline.value(), 100.0);
    }

    #[test]
    fn master_switch_blocks_alerts_but_tracks_state() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig {
            notifications_enabled: false,
            ..Default::default()
        };
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        assert!(ev.evaluate_at(&reading(true, 100.0, 95.0), &cfg, t0).is_empty());
        assert_eq!(ev.state(1).unwrap().last_temperature, 95.0);
    }

    #[test]
    fn independent_cooldowns_per_alert_type() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);

        let temp = ev.evaluate_at(&reading(true, 100.0, 80.0), &cfg, t0);
        assert_eq!(temp.len(), 1);

        let offline = ev.evaluate_at(&reading(false, 0.0, 0.0), &cfg, t0 + Duration::seconds(1));
        assert_eq!(offline.len(), 1);
        assert_eq!(offline[0].alert_type, AlertType::Offline);

        // Back online and hot: temperature is still cooling down, so nothing fires.
        let again = ev.evaluate_at(&reading(true, 100.0, 80.0), &cfg, t0 + Duration::seconds(2));
        assert!(again.is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut ev = AlertEvaluator::new();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &AlertConfig::default(), Utc::now());
        assert!(ev.clear(1));
        assert!(!ev.clear(1));
        assert!(!ev.clear(999));
        assert!(ev.state(1).is_none());
    }

    #[test]
    fn cleared_device_gets_first_reading_exemption_again() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);
        ev.clear(1);
        assert!(ev.evaluate_at(&reading(false, 0.0, 0.0), &cfg, t0).is_empty());
    }

    #[test]
    fn non_finite_readings_never_fire() {
        let mut ev = AlertEvaluator::new();
        let cfg = AlertConfig::default();
        let t0 = Utc::now();
        ev.evaluate_at(&reading(true, 100.0, 50.0), &cfg, t0);

        for (i, bad) in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY].into_iter().enumerate() {
            let at = t0 + Duration::minutes(10 * (i as i64 + 1));
            let alerts = ev.evaluate_at(&reading(true, bad, bad), &cfg, at);
            assert!(alerts.is_empty(), "{bad} fired {alerts:?}");
        }
        assert_eq!(ev.state(1).unwrap().hashrate_baseline.value(), 100.0);

        // A real drop afterwards is still measured against the untouched baseline.
        let alerts = ev.evaluate_at(&reading(true, 40.0, 50.0), &cfg, t0 + Duration::hours(1));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::HashrateDrop);
    }
}
