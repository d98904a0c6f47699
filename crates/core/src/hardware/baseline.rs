//! Adaptive hashrate baseline.
//!
//! An exponential moving average with a small smoothing factor: a gradual
//! throughput change moves the baseline along with it, while a sudden drop is
//! still measured against the older, higher value.

/// Weight given to the newest reading.
pub const EMA_ALPHA: f64 = 0.05;

/// Exponential moving average of a device's hashrate. Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HashrateBaseline(f64);

impl HashrateBaseline {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0 > 0.0
    }

    /// Fold a new reading into the average.
    ///
    /// The first positive reading seeds the baseline directly. Non-positive
    /// and non-finite readings are ignored.
    pub fn update(&mut self, hashrate: f64) {
        if !hashrate.is_finite() || hashrate <= 0.0 {
            return;
        }
        if self.is_set() {
            self.0 = self.0 * (1.0 - EMA_ALPHA) + hashrate * EMA_ALPHA;
        } else {
            self.0 = hashrate;
        }
    }

    /// Percentage by which `hashrate` sits below the baseline.
    ///
    /// Negative when the reading is above the baseline. `None` while unset.
    pub fn drop_percent(self, hashrate: f64) -> Option<f64> {
        self.is_set().then(|| (self.0 - hashrate) / self.0 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reading_seeds_baseline() {
        let mut b = HashrateBaseline::default();
        assert!(!b.is_set());
        b.update(100.0);
        assert_eq!(b.value(), 100.0);
    }

    #[test]
    fn zero_reading_is_ignored() {
        let mut b = HashrateBaseline::default();
        b.update(0.0);
        assert!(!b.is_set());
        b.update(100.0);
        b.update(0.0);
        assert_eq!(b.value(), 100.0);
    }

    #[test]
    fn non_finite_readings_are_ignored() {
        let mut b = HashrateBaseline::default();
        b.update(f64::NAN);
        b.update(f64::INFINITY);
        assert!(!b.is_set());

        b.update(100.0);
        b.update(f64::INFINITY);
        b.update(f64::NAN);
        b.update(f64::NEG_INFINITY);
        assert_eq!(b.value(), 100.0);
    }

    #[test]
    fn single_update_applies_smoothing() {
        let mut b = HashrateBaseline::default();
        b.update(100.0);
        b.update(200.0);
        assert!((b.value() - 105.0).abs() < 1e-9);
    }

    #[test]
    fn converges_to_constant_input() {
        let mut b = HashrateBaseline::default();
        b.update(50.0);
        for _ in 0..300 {
            b.update(120.0);
        }
        assert!((b.value() - 120.0).abs() < 0.01, "baseline = {}", b.value());
    }

    #[test]
    fn stays_within_bounds_of_fed_values() {
        let readings = [90.0, 110.0, 95.0, 130.0, 80.0, 100.0, 125.0, 85.0];
        let mut b = HashrateBaseline::default();
        for _ in 0..20 {
            for r in readings {
                b.update(r);
                assert!((80.0..=130.0).contains(&b.value()));
            }
        }
    }

    #[test]
    fn drop_percent_against_baseline() {
        let mut b = HashrateBaseline::default();
        assert_eq!(b.drop_percent(50.0), None);
        b.update(100.0);
        assert_eq!(b.drop_percent(40.0), Some(60.0));
        assert_eq!(b.drop_percent(110.0), Some(-10.0));
    }
}
