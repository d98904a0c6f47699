//! Per-device alert state.

use crate::hardware::baseline::HashrateBaseline;
use crate::hardware::cooldown::AlertCooldowns;
use crate::types::DbId;

/// Everything the evaluator remembers about one device between readings.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceAlertState {
    pub device_id: DbId,
    pub last_online: bool,
    pub last_hashrate: f64,
    pub last_temperature: f64,
    pub hashrate_baseline: HashrateBaseline,
    pub cooldowns: AlertCooldowns,
}

impl DeviceAlertState {
    /// State recorded from a device's first reading.
    pub fn initial(device_id: DbId, is_online: bool, hashrate: f64, temperature: f64) -> Self {
        let mut state = Self {
            device_id,
            last_online: is_online,
            last_hashrate: hashrate,
            last_temperature: temperature,
            hashrate_baseline: HashrateBaseline::default(),
            cooldowns: AlertCooldowns::default(),
        };
        if is_online {
            state.hashrate_baseline.update(hashrate);
        }
        state
    }

    /// Record the raw values of the latest reading.
    pub fn observe(&mut self, is_online: bool, hashrate: f64, temperature: f64) {
        self.last_online = is_online;
        self.last_hashrate = hashrate;
        self.last_temperature = temperature;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_online_reading_seeds_baseline() {
        let s = DeviceAlertState::initial(1, true, 95.0, 60.0);
        assert!(s.last_online);
        assert_eq!(s.hashrate_baseline.value(), 95.0);
    }

    #[test]
    fn initial_offline_reading_leaves_baseline_unset() {
        let s = DeviceAlertState::initial(1, false, 95.0, 0.0);
        assert!(!s.last_online);
        assert!(!s.hashrate_baseline.is_set());
    }
}
