//! Hysteresis decisions.

use crate::config::SweepThresholds;

/// Evaluate if a sweep should start for the given free fraction.
///
/// # Returns
///
/// `true` only when free space is strictly below the critical threshold.
pub fn should_start_sweep(free_fraction: f64, thresholds: &SweepThresholds) -> bool {
    free_fraction < thresholds.critical()
}

/// Evaluate if a running sweep has restored enough headroom.
pub fn target_reached(free_fraction: f64, thresholds: &SweepThresholds) -> bool {
    free_fraction >= thresholds.target()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> SweepThresholds {
        SweepThresholds::new(0.15, 0.20).expect("thresholds")
    }

    #[test]
    fn test_start_below_critical_only() {
        let t = thresholds();
        assert!(should_start_sweep(0.10, &t));
        assert!(should_start_sweep(0.1499, &t));
        assert!(!should_start_sweep(0.15, &t));
        assert!(!should_start_sweep(0.18, &t));
    }

    #[test]
    fn test_target_inclusive() {
        let t = thresholds();
        assert!(!target_reached(0.16, &t));
        assert!(!target_reached(0.1999, &t));
        assert!(target_reached(0.20, &t));
        assert!(target_reached(0.21, &t));
    }

    #[test]
    fn test_band_between_thresholds() {
        // Inside the band a sweep neither starts nor counts as finished.
        let t = thresholds();
        assert!(!should_start_sweep(0.17, &t));
        assert!(!target_reached(0.17, &t));
    }
}
