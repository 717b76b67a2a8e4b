//! Detection Samples
//!
//! Types for the readings produced by the radar decoder and for the
//! calibrated form that the tracker consumes.

use serde::{Deserialize, Serialize};

/// Sensor-assigned identifier of a concurrently tracked object.
///
/// The radar reuses slot numbers once the previous occupant leaves range.
pub type Slot = u8;

/// Capture time in milliseconds on a monotonic session clock.
pub type Timestamp = u64;

/// One radar reading as delivered by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSample {
    /// Tracking slot the sensor assigned this reading to
    pub slot: Slot,
    /// Sensor-reported speed, sign may indicate approaching or receding
    pub raw_speed: f64,
    /// Distance to the object in meters
    pub distance: f64,
    /// Monotonic capture time
    pub timestamp: Timestamp,
}

impl DetectionSample {
    pub fn new(slot: Slot, raw_speed: f64, distance: f64, timestamp: Timestamp) -> Self {
        DetectionSample {
            slot,
            raw_speed,
            distance,
            timestamp,
        }
    }
}

/// A sample that passed the admission window, with the speed calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibratedSample {
    pub slot: Slot,
    /// `raw_speed * slope + offset`
    pub speed: f64,
    pub distance: f64,
    pub timestamp: Timestamp,
}

/// Reasons a sample is malformed and must be dropped before tracking.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("slot {slot} outside valid range {min}..={max}")]
    SlotOutOfRange { slot: Slot, min: Slot, max: Slot },

    #[error("non-finite speed {0}")]
    NonFiniteSpeed(f64),

    #[error("non-finite distance {0}")]
    NonFiniteDistance(f64),
}
