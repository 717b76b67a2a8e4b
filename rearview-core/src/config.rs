//! Pass Tracking Configuration
//!
//! Calibration, admission window and lifecycle parameters. The configuration
//! is built once at startup, validated, and then shared by reference with
//! the filter, the tracker and the engine. Nothing mutates it during a run.

use serde::{Deserialize, Serialize};

use crate::sample::Slot;

/// Default silence before an open pass is closed (milliseconds)
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 10_000;

/// Default share of the fastest samples dropped for the trimmed maximum
pub const DEFAULT_TRIM_PERCENT: u8 = 5;

/// Linear speed correction: `speed = raw_speed * slope + offset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Calibration {
    pub slope: f64,
    pub offset: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration {
            slope: 1.0,
            offset: 0.0,
        }
    }
}

impl Calibration {
    pub fn apply(&self, raw_speed: f64) -> f64 {
        raw_speed * self.slope + self.offset
    }
}

/// Distance range (meters, inclusive) in which samples are trusted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdmissionWindow {
    pub low: f64,
    pub high: f64,
}

impl Default for AdmissionWindow {
    fn default() -> Self {
        AdmissionWindow {
            low: 0.0,
            high: 255.0,
        }
    }
}

impl AdmissionWindow {
    pub fn contains(&self, distance: f64) -> bool {
        self.low <= distance && distance <= self.high
    }
}

/// Complete configuration of the pass tracking core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassConfig {
    pub calibration: Calibration,

    pub admission: AdmissionWindow,

    /// Silence on a slot before its pass is closed
    pub idle_timeout_ms: u64,

    /// Lowest slot number the sensor assigns
    pub min_slot: Slot,

    /// Highest slot number the sensor assigns
    pub max_slot: Slot,

    /// Percentage of the fastest samples ignored by the trimmed maximum
    pub trim_percent: u8,
}

impl Default for PassConfig {
    fn default() -> Self {
        PassConfig {
            calibration: Calibration::default(),
            admission: AdmissionWindow::default(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            min_slot: Slot::MIN,
            max_slot: Slot::MAX,
            trim_percent: DEFAULT_TRIM_PERCENT,
        }
    }
}

/// Configuration errors, fatal at startup
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("calibration values must be finite (slope {slope}, offset {offset})")]
    NonFiniteCalibration { slope: f64, offset: f64 },

    #[error("distance thresholds must be finite (low {low}, high {high})")]
    NonFiniteThreshold { low: f64, high: f64 },

    #[error("low distance threshold {low} is above high threshold {high}")]
    InvertedThresholds { low: f64, high: f64 },

    #[error("idle timeout must be greater than zero")]
    ZeroIdleTimeout,

    #[error("trim percentage {0} is above 100")]
    TrimPercentTooHigh(u8),

    #[error("slot range {min}..={max} is empty")]
    EmptySlotRange { min: Slot, max: Slot },
}

impl PassConfig {
    /// Check the configuration before any sample is processed
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Calibration { slope, offset } = self.calibration;
        if !slope.is_finite() || !offset.is_finite() {
            return Err(ConfigError::NonFiniteCalibration { slope, offset });
        }

        let AdmissionWindow { low, high } = self.admission;
        if !low.is_finite() || !high.is_finite() {
            return Err(ConfigError::NonFiniteThreshold { low, high });
        }
        if low > high {
            return Err(ConfigError::InvertedThresholds { low, high });
        }

        if self.idle_timeout_ms == 0 {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        if self.trim_percent > 100 {
            return Err(ConfigError::TrimPercentTooHigh(self.trim_percent));
        }
        if self.min_slot > self.max_slot {
            return Err(ConfigError::EmptySlotRange {
                min: self.min_slot,
                max: self.max_slot,
            });
        }
        Ok(())
    }
}
