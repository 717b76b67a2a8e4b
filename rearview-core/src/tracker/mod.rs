//! Vehicle Track Manager
//!
//! Associates accepted samples with vehicle passes, one open pass per slot.
//!
//! # Lifecycle
//!
//! - **Open**: the first accepted sample on a slot with no open pass opens
//!   a new pass.
//! - **Extend**: later samples on the same slot are appended to it.
//! - **Close**: a tick closes every pass whose slot has been silent for
//!   longer than the idle timeout. The sensor never signals the end of a
//!   pass, so silence is the only termination criterion.
//! - **Reuse**: a sample on a slot whose pass was closed opens a new pass.
//!   Closed passes are never resurrected; the sensor hands freed slot
//!   numbers to unrelated objects.
//! - **Flush**: at end of run every open pass is closed.
//!
//! ```rust,ignore
//! use rearview_core::{filter, PassConfig, TrackManager};
//!
//! let config = PassConfig::default();
//! let mut tracker = TrackManager::new(&config);
//!
//! if let Some(calibrated) = filter(&sample, &config) {
//!     tracker.on_sample(&calibrated)?;
//! }
//! for pass in tracker.on_tick(now) {
//!     // hand the closed pass to the aggregator
//! }
//! ```

use std::collections::BTreeMap;

use crate::config::PassConfig;
use crate::sample::{CalibratedSample, DetectionSample, SampleError, Slot, Timestamp};

mod pass;

pub use pass::{PassId, PassPoint, VehiclePass};

/// What `on_sample` did with an accepted sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassUpdate {
    /// A new pass was opened on the sample's slot
    Opened(PassId),
    /// The sample was appended to the open pass
    Extended(PassId),
}

/// Owner of all open vehicle passes
pub struct TrackManager<'a> {
    config: &'a PassConfig,
    /// Open passes by slot; absence means the slot is free
    open: BTreeMap<Slot, VehiclePass>,
    next_id: u64,
}

impl<'a> TrackManager<'a> {
    pub fn new(config: &'a PassConfig) -> Self {
        TrackManager {
            config,
            open: BTreeMap::new(),
            next_id: 0,
        }
    }

    fn next_pass_id(&mut self) -> PassId {
        let id = PassId(self.next_id);
        self.next_id += 1;
        id
    }

    fn validate(&self, slot: Slot, speed: f64, distance: f64) -> Result<(), SampleError> {
        if slot < self.config.min_slot || slot > self.config.max_slot {
            return Err(SampleError::SlotOutOfRange {
                slot,
                min: self.config.min_slot,
                max: self.config.max_slot,
            });
        }
        if !speed.is_finite() {
            return Err(SampleError::NonFiniteSpeed(speed));
        }
        if !distance.is_finite() {
            return Err(SampleError::NonFiniteDistance(distance));
        }
        Ok(())
    }

    /// Check a decoded sample for malformed fields before it is filtered
    pub fn check(&self, sample: &DetectionSample) -> Result<(), SampleError> {
        self.validate(sample.slot, sample.raw_speed, sample.distance)
    }

    /// Attribute an accepted sample to the open pass on its slot, or open one.
    ///
    /// Malformed samples are rejected without touching any pass.
    pub fn on_sample(&mut self, sample: &CalibratedSample) -> Result<PassUpdate, SampleError> {
        self.validate(sample.slot, sample.speed, sample.distance)?;

        if let Some(pass) = self.open.get_mut(&sample.slot) {
            pass.push(sample);
            return Ok(PassUpdate::Extended(pass.id()));
        }

        let id = self.next_pass_id();
        self.open.insert(sample.slot, VehiclePass::open(id, sample));
        Ok(PassUpdate::Opened(id))
    }

    /// Close every pass silent for longer than the idle timeout.
    ///
    /// Closed passes are returned in slot order.
    pub fn on_tick(&mut self, now: Timestamp) -> Vec<VehiclePass> {
        let timeout = self.config.idle_timeout_ms;
        let idle: Vec<Slot> = self
            .open
            .iter()
            .filter(|(_, pass)| pass.is_idle(now, timeout))
            .map(|(slot, _)| *slot)
            .collect();

        idle.into_iter()
            .filter_map(|slot| self.open.remove(&slot))
            .collect()
    }

    /// Close all open passes, in slot order
    pub fn flush(&mut self) -> Vec<VehiclePass> {
        std::mem::take(&mut self.open).into_values().collect()
    }

    /// The open pass on a slot, if any
    pub fn get(&self, slot: Slot) -> Option<&VehiclePass> {
        self.open.get(&slot)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PassConfig {
        PassConfig {
            idle_timeout_ms: 1000,
            min_slot: 0,
            max_slot: 7,
            ..Default::default()
        }
    }

    fn sample(slot: Slot, speed: f64, timestamp: Timestamp) -> CalibratedSample {
        CalibratedSample {
            slot,
            speed,
            distance: 40.0,
            timestamp,
        }
    }

    #[test]
    fn test_first_sample_opens_pass() {
        let config = config();
        let mut tracker = TrackManager::new(&config);

        let update = tracker.on_sample(&sample(1, 20.0, 100)).unwrap();
        assert_eq!(update, PassUpdate::Opened(PassId(0)));

        let pass = tracker.get(1).unwrap();
        assert_eq!(pass.start_time(), 100);
        assert_eq!(pass.last_seen(), 100);
        assert_eq!(pass.speeds().collect::<Vec<_>>(), vec![20.0]);
    }

    #[test]
    fn test_samples_extend_open_pass() {
        let config = config();
        let mut tracker = TrackManager::new(&config);

        tracker.on_sample(&sample(1, 20.0, 100)).unwrap();
        let update = tracker.on_sample(&sample(1, 22.0, 200)).unwrap();
        assert_eq!(update, PassUpdate::Extended(PassId(0)));

        assert_eq!(tracker.open_count(), 1);
        let pass = tracker.get(1).unwrap();
        assert_eq!(pass.start_time(), 100);
        assert_eq!(pass.last_seen(), 200);
        assert_eq!(pass.len(), 2);
    }

    #[test]
    fn test_one_open_pass_per_slot() {
        let config = config();
        let mut tracker = TrackManager::new(&config);

        for (i, slot) in [1, 2, 1, 3, 2, 1].into_iter().enumerate() {
            tracker.on_sample(&sample(slot, 20.0, i as u64 * 10)).unwrap();
        }

        assert_eq!(tracker.open_count(), 3);
        assert_eq!(tracker.get(1).unwrap().len(), 3);
        assert_eq!(tracker.get(2).unwrap().len(), 2);
        assert_eq!(tracker.get(3).unwrap().len(), 1);
    }

    #[test]
    fn test_idle_timeout_closes_after_not_at() {
        let config = config();
        let mut tracker = TrackManager::new(&config);
        tracker.on_sample(&sample(1, 20.0, 5000)).unwrap();

        assert!(tracker.on_tick(5500).is_empty());
        assert!(tracker.on_tick(6000).is_empty());
        assert_eq!(tracker.open_count(), 1);

        let closed = tracker.on_tick(6001);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].slot(), 1);
        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn test_tick_only_closes_idle_slots() {
        let config = config();
        let mut tracker = TrackManager::new(&config);
        tracker.on_sample(&sample(1, 20.0, 0)).unwrap();
        tracker.on_sample(&sample(2, 30.0, 800)).unwrap();

        let closed = tracker.on_tick(1500);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].slot(), 1);
        assert!(tracker.get(2).is_some());
    }

    #[test]
    fn test_slot_reuse_opens_new_pass() {
        let config = config();
        let mut tracker = TrackManager::new(&config);

        tracker.on_sample(&sample(4, 20.0, 0)).unwrap();
        let first = tracker.on_tick(2000).pop().unwrap();

        let update = tracker.on_sample(&sample(4, 35.0, 3000)).unwrap();
        assert_eq!(update, PassUpdate::Opened(PassId(1)));

        let second = tracker.get(4).unwrap();
        assert_ne!(second.id(), first.id());
        assert_ne!(second.start_time(), first.start_time());
        assert_eq!(second.speeds().collect::<Vec<_>>(), vec![35.0]);
        assert_eq!(first.speeds().collect::<Vec<_>>(), vec![20.0]);
    }

    #[test]
    fn test_flush_closes_everything_once() {
        let config = config();
        let mut tracker = TrackManager::new(&config);
        tracker.on_sample(&sample(3, 20.0, 0)).unwrap();
        tracker.on_sample(&sample(1, 20.0, 0)).unwrap();

        let flushed = tracker.flush();
        let slots: Vec<Slot> = flushed.iter().map(|p| p.slot()).collect();
        assert_eq!(slots, vec![1, 3]);

        assert!(tracker.flush().is_empty());
        assert!(tracker.on_tick(u64::MAX).is_empty());
    }

    #[test]
    fn test_malformed_samples_rejected() {
        let config = config();
        let mut tracker = TrackManager::new(&config);

        assert_eq!(
            tracker.on_sample(&sample(8, 20.0, 0)),
            Err(SampleError::SlotOutOfRange {
                slot: 8,
                min: 0,
                max: 7
            })
        );
        assert!(matches!(
            tracker.on_sample(&sample(1, f64::NAN, 0)),
            Err(SampleError::NonFiniteSpeed(_))
        ));

        let mut bad_distance = sample(1, 20.0, 0);
        bad_distance.distance = f64::INFINITY;
        assert_eq!(
            tracker.on_sample(&bad_distance),
            Err(SampleError::NonFiniteDistance(f64::INFINITY))
        );

        assert_eq!(tracker.open_count(), 0);
    }

    #[test]
    fn test_check_detection_sample() {
        let config = config();
        let tracker = TrackManager::new(&config);

        assert!(tracker.check(&DetectionSample::new(2, 10.0, 20.0, 0)).is_ok());
        assert!(matches!(
            tracker.check(&DetectionSample::new(2, 10.0, f64::NAN, 0)),
            Err(SampleError::NonFiniteDistance(_))
        ));
        assert!(matches!(
            tracker.check(&DetectionSample::new(9, 10.0, 20.0, 0)),
            Err(SampleError::SlotOutOfRange { .. })
        ));
    }
}
