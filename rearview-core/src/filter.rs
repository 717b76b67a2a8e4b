//! Calibration & Threshold Filter
//!
//! Applies the linear speed correction and the distance admission window.
//! Pure function of the sample and the configuration.

use crate::config::PassConfig;
use crate::sample::{CalibratedSample, DetectionSample};

/// Calibrate a sample and check it against the admission window.
///
/// Calibration is applied unconditionally. Returns `None` when the distance
/// is outside `[low, high]`; such samples never reach the tracker.
pub fn filter(sample: &DetectionSample, config: &PassConfig) -> Option<CalibratedSample> {
    let speed = config.calibration.apply(sample.raw_speed);

    if !config.admission.contains(sample.distance) {
        return None;
    }

    Some(CalibratedSample {
        slot: sample.slot,
        speed,
        distance: sample.distance,
        timestamp: sample.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdmissionWindow, Calibration};

    fn config() -> PassConfig {
        PassConfig {
            calibration: Calibration {
                slope: 1.25,
                offset: -2.0,
            },
            admission: AdmissionWindow {
                low: 10.0,
                high: 100.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_speed_calibration_exact() {
        let config = config();
        for raw in [0.0, 8.0, 31.5, -12.0, 250.0] {
            let sample = DetectionSample::new(1, raw, 50.0, 0);
            let calibrated = filter(&sample, &config).unwrap();
            assert_eq!(calibrated.speed, raw * 1.25 + -2.0);
        }
    }

    #[test]
    fn test_window_edges_accepted() {
        let config = config();
        assert!(filter(&DetectionSample::new(1, 20.0, 10.0, 0), &config).is_some());
        assert!(filter(&DetectionSample::new(1, 20.0, 100.0, 0), &config).is_some());
    }

    #[test]
    fn test_outside_window_rejected() {
        let config = config();
        assert!(filter(&DetectionSample::new(1, 20.0, 9.5, 0), &config).is_none());
        assert!(filter(&DetectionSample::new(1, 20.0, 100.5, 0), &config).is_none());
    }

    #[test]
    fn test_fields_carried_through() {
        let sample = DetectionSample::new(4, 10.0, 42.0, 1234);
        let calibrated = filter(&sample, &config()).unwrap();

        assert_eq!(calibrated.slot, 4);
        assert_eq!(calibrated.distance, 42.0);
        assert_eq!(calibrated.timestamp, 1234);
    }
}
