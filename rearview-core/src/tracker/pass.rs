//! Vehicle Pass
//!
//! One tracked vehicle's traversal through the detection zone.

use serde::{Deserialize, Serialize};

use crate::sample::{CalibratedSample, Slot, Timestamp};

/// Sequence number of a pass, unique within a tracker's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PassId(pub u64);

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One accepted sample retained in a pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassPoint {
    /// Calibrated speed
    pub speed: f64,
    /// Distance in meters
    pub distance: f64,
}

/// An open (or just closed) vehicle pass.
///
/// Only the [`TrackManager`](super::TrackManager) mutates a pass. Once closed
/// it is handed over by value and is not modified again.
#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePass {
    id: PassId,
    slot: Slot,
    start_time: Timestamp,
    last_seen: Timestamp,
    points: Vec<PassPoint>,
}

impl VehiclePass {
    /// Open a pass from its first accepted sample
    pub(crate) fn open(id: PassId, sample: &CalibratedSample) -> Self {
        VehiclePass {
            id,
            slot: sample.slot,
            start_time: sample.timestamp,
            last_seen: sample.timestamp,
            points: vec![PassPoint {
                speed: sample.speed,
                distance: sample.distance,
            }],
        }
    }

    /// Append a sample. A timestamp older than the last one seen does not
    /// move `last_seen` backwards.
    pub(crate) fn push(&mut self, sample: &CalibratedSample) {
        self.last_seen = self.last_seen.max(sample.timestamp);
        self.points.push(PassPoint {
            speed: sample.speed,
            distance: sample.distance,
        });
    }

    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn last_seen(&self) -> Timestamp {
        self.last_seen
    }

    /// Retained samples in arrival order
    pub fn points(&self) -> &[PassPoint] {
        &self.points
    }

    /// Calibrated speeds in arrival order
    pub fn speeds(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.speed)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a pass is opened by a sample
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True once more than `idle_timeout_ms` has elapsed since the last sample
    pub fn is_idle(&self, now: Timestamp, idle_timeout_ms: u64) -> bool {
        now.saturating_sub(self.last_seen) > idle_timeout_ms
    }

    pub(crate) fn into_points(self) -> Vec<PassPoint> {
        self.points
    }
}
