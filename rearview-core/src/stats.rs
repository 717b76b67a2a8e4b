//! Pass Statistics
//!
//! Summary of a closed vehicle pass: peak, trimmed peak and mean speed.
//!
//! The trimmed peak ignores the fastest `trim_percent` of the samples
//! (rounded up), which suppresses single-sample spikes above the true peak.
//! With the default 5% a pass of 1..=20 samples drops one sample, 21..=40
//! drops two, and so on. When trimming would drop every sample the trimmed
//! peak falls back to the plain peak.

use serde::{Deserialize, Serialize};

use crate::sample::{Slot, Timestamp};
use crate::tracker::{PassId, PassPoint, VehiclePass};

/// Summary of a closed vehicle pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub id: PassId,
    pub slot: Slot,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub sample_count: usize,
    pub max_speed: f64,
    pub trimmed_max_speed: f64,
    pub average_speed: f64,
    /// All retained samples in arrival order
    pub points: Vec<PassPoint>,
}

impl PassSummary {
    /// Speeds in arrival order
    pub fn speeds(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.speed)
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Number of samples dropped from the top: `ceil(count * percent / 100)`
pub fn trim_count(count: usize, trim_percent: u8) -> usize {
    (count * trim_percent as usize).div_ceil(100)
}

/// Highest speed after dropping the fastest `trim_percent` of the samples.
///
/// Returns `None` only for an empty slice, or when every sample would be
/// dropped.
pub fn trimmed_max(speeds: &[f64], trim_percent: u8) -> Option<f64> {
    let drop = trim_count(speeds.len(), trim_percent);
    if drop >= speeds.len() {
        return None;
    }

    // Stable sort keeps equal speeds in arrival order
    let mut sorted = speeds.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len() - drop - 1])
}

/// Summarize a closed pass. The pass is consumed.
pub fn summarize(pass: VehiclePass, trim_percent: u8) -> PassSummary {
    let id = pass.id();
    let slot = pass.slot();
    let start_time = pass.start_time();
    let end_time = pass.last_seen();
    let points = pass.into_points();

    let speeds: Vec<f64> = points.iter().map(|p| p.speed).collect();
    let sample_count = speeds.len();
    let max_speed = speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let trimmed_max_speed = trimmed_max(&speeds, trim_percent).unwrap_or(max_speed);
    let average_speed = speeds.iter().sum::<f64>() / sample_count as f64;

    PassSummary {
        id,
        slot,
        start_time,
        end_time,
        sample_count,
        max_speed,
        trimmed_max_speed,
        average_speed,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassConfig;
    use crate::sample::CalibratedSample;
    use crate::tracker::TrackManager;

    fn closed_pass(speeds: &[f64]) -> VehiclePass {
        let config = PassConfig::default();
        let mut tracker = TrackManager::new(&config);
        for (i, speed) in speeds.iter().enumerate() {
            tracker
                .on_sample(&CalibratedSample {
                    slot: 1,
                    speed: *speed,
                    distance: 20.0 + i as f64,
                    timestamp: 1000 + i as u64 * 100,
                })
                .unwrap();
        }
        tracker.flush().pop().unwrap()
    }

    #[test]
    fn test_trim_count_rounds_up() {
        assert_eq!(trim_count(1, 5), 1);
        assert_eq!(trim_count(5, 5), 1);
        assert_eq!(trim_count(20, 5), 1);
        assert_eq!(trim_count(21, 5), 2);
        assert_eq!(trim_count(40, 5), 2);
        assert_eq!(trim_count(60, 5), 3);
        assert_eq!(trim_count(10, 0), 0);
        assert_eq!(trim_count(10, 100), 10);
    }

    #[test]
    fn test_five_sample_pass() {
        let summary = summarize(closed_pass(&[10.0, 12.0, 11.0, 13.0, 9.0]), 5);

        assert_eq!(summary.sample_count, 5);
        assert_eq!(summary.max_speed, 13.0);
        assert_eq!(summary.trimmed_max_speed, 12.0);
        assert_eq!(summary.average_speed, 11.0);
    }

    #[test]
    fn test_single_sample_pass() {
        let summary = summarize(closed_pass(&[15.0]), 5);

        assert_eq!(summary.sample_count, 1);
        assert_eq!(summary.max_speed, 15.0);
        assert_eq!(summary.trimmed_max_speed, 15.0);
        assert_eq!(summary.average_speed, 15.0);
    }

    #[test]
    fn test_spike_suppressed() {
        let mut speeds = vec![30.0; 19];
        speeds[10] = 95.0;
        let summary = summarize(closed_pass(&speeds), 5);

        assert_eq!(summary.max_speed, 95.0);
        assert_eq!(summary.trimmed_max_speed, 30.0);
        assert!(summary.trimmed_max_speed <= summary.max_speed);
    }

    #[test]
    fn test_average_uses_all_samples() {
        let summary = summarize(closed_pass(&[10.0, 20.0, 30.0, 100.0]), 5);
        assert_eq!(summary.average_speed, 40.0);
        assert_eq!(summary.trimmed_max_speed, 30.0);
    }

    #[test]
    fn test_trimmed_max_never_above_max() {
        for count in 1..=60 {
            let speeds: Vec<f64> = (0..count).map(|i| ((i * 37) % 23) as f64).collect();
            let max = speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let trimmed = trimmed_max(&speeds, 5).unwrap_or(max);
            assert!(trimmed <= max, "count {}", count);
        }
    }

    #[test]
    fn test_trimmed_max_without_trim() {
        assert_eq!(trimmed_max(&[3.0, 7.0, 5.0], 0), Some(7.0));
        assert_eq!(trimmed_max(&[], 5), None);
        assert_eq!(trimmed_max(&[3.0], 5), None);
    }

    #[test]
    fn test_summary_times_and_points() {
        let summary = summarize(closed_pass(&[10.0, 11.0, 12.0]), 5);

        assert_eq!(summary.slot, 1);
        assert_eq!(summary.start_time, 1000);
        assert_eq!(summary.end_time, 1200);
        assert_eq!(summary.duration_ms(), 200);
        assert_eq!(summary.speeds().collect::<Vec<_>>(), vec![10.0, 11.0, 12.0]);
        assert_eq!(summary.points[2].distance, 22.0);
    }
}
