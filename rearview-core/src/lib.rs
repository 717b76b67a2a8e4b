//! Vehicle pass tracking for rear-view bicycle radars
//!
//! This crate turns the stream of detection samples reported by a rear-view
//! radar into vehicle passes with speed statistics. It contains no I/O and
//! no async code; the host feeds samples and clock ticks in and receives
//! events back.
//!
//! # Architecture
//!
//! - **sample**: decoded and calibrated sample types
//! - **config**: calibration, admission window and lifecycle parameters
//! - **filter**: calibration & threshold filter
//! - **tracker**: slot to pass association and pass lifecycle
//! - **stats**: per-pass summary (peak, trimmed peak, average)
//! - **engine**: single state machine tying the above together
//!
//! Data flows decoder → filter → tracker → (on close) stats → reporter.

pub mod config;
pub mod engine;
pub mod filter;
pub mod sample;
pub mod stats;
pub mod tracker;

pub use config::{AdmissionWindow, Calibration, ConfigError, PassConfig};
pub use engine::{DataQuality, DropReason, EngineInput, PassEngine, PassEvent};
pub use filter::filter;
pub use sample::{CalibratedSample, DetectionSample, SampleError, Slot, Timestamp};
pub use stats::{summarize, trimmed_max, PassSummary};
pub use tracker::{PassId, PassPoint, PassUpdate, TrackManager, VehiclePass};
