//! Pass Engine
//!
//! Single state machine driving the filter, the tracker and the aggregator.
//! Sample arrivals and clock ticks are merged by the host into one ordered
//! stream of [`EngineInput`]; every input is handled to completion before
//! the next one, so pass state never needs locking.
//!
//! ```rust,ignore
//! let mut engine = PassEngine::new(&config);
//! loop {
//!     let input = next_input();   // sample or tick, in arrival order
//!     for event in engine.handle(input) {
//!         reporter.report(&event);
//!     }
//! }
//! // End of stream, cancellation or run-time limit
//! for event in engine.finish() {
//!     reporter.report(&event);
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PassConfig;
use crate::filter::filter;
use crate::sample::{CalibratedSample, DetectionSample, SampleError, Slot, Timestamp};
use crate::stats::{summarize, PassSummary};
use crate::tracker::{TrackManager, VehiclePass};

/// One step of the ingestion stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineInput {
    /// A decoded sample
    Sample(DetectionSample),
    /// Current session clock, drives the idle sweep
    Tick(Timestamp),
}

/// Why a sample was dropped
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropReason {
    /// Malformed fields (data-quality error)
    Malformed(SampleError),
    /// Distance outside the admission window
    OutOfWindow { slot: Slot, distance: f64 },
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Malformed(e) => write!(f, "malformed sample: {}", e),
            DropReason::OutOfWindow { slot, distance } => {
                write!(f, "slot {}: distance {} outside admission window", slot, distance)
            }
        }
    }
}

/// Output of the engine
#[derive(Debug, Clone, PartialEq)]
pub enum PassEvent {
    /// An accepted, calibrated sample (for verbatim streaming)
    Sample(CalibratedSample),
    /// A finalized pass
    Summary(PassSummary),
    /// A sample that never reached the tracker
    Dropped(DropReason),
}

/// Running counters for data-quality reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub accepted: u64,
    pub malformed: u64,
    pub out_of_window: u64,
    pub passes: u64,
}

pub struct PassEngine<'a> {
    config: &'a PassConfig,
    tracker: TrackManager<'a>,
    quality: DataQuality,
}

impl<'a> PassEngine<'a> {
    /// The configuration must already be validated
    pub fn new(config: &'a PassConfig) -> Self {
        PassEngine {
            config,
            tracker: TrackManager::new(config),
            quality: DataQuality::default(),
        }
    }

    pub fn handle(&mut self, input: EngineInput) -> Vec<PassEvent> {
        match input {
            EngineInput::Sample(sample) => self.on_sample(&sample).into_iter().collect(),
            EngineInput::Tick(now) => {
                let closed = self.tracker.on_tick(now);
                self.summarize_all(closed)
            }
        }
    }

    fn on_sample(&mut self, sample: &DetectionSample) -> Option<PassEvent> {
        if let Err(e) = self.tracker.check(sample) {
            self.quality.malformed += 1;
            return Some(PassEvent::Dropped(DropReason::Malformed(e)));
        }

        let Some(calibrated) = filter(sample, self.config) else {
            self.quality.out_of_window += 1;
            return Some(PassEvent::Dropped(DropReason::OutOfWindow {
                slot: sample.slot,
                distance: sample.distance,
            }));
        };

        match self.tracker.on_sample(&calibrated) {
            Ok(_) => {
                self.quality.accepted += 1;
                Some(PassEvent::Sample(calibrated))
            }
            // Calibration can overflow a finite raw speed
            Err(e) => {
                self.quality.malformed += 1;
                Some(PassEvent::Dropped(DropReason::Malformed(e)))
            }
        }
    }

    /// Close and summarize every open pass. Call once when the stream ends,
    /// whatever the reason.
    pub fn finish(&mut self) -> Vec<PassEvent> {
        let open = self.tracker.flush();
        self.summarize_all(open)
    }

    fn summarize_all(&mut self, passes: Vec<VehiclePass>) -> Vec<PassEvent> {
        self.quality.passes += passes.len() as u64;
        passes
            .into_iter()
            .map(|pass| PassEvent::Summary(summarize(pass, self.config.trim_percent)))
            .collect()
    }

    pub fn quality(&self) -> DataQuality {
        self.quality
    }

    pub fn open_passes(&self) -> usize {
        self.tracker.open_count()
    }

    pub fn tracker(&self) -> &TrackManager<'a> {
        &self.tracker
    }
}
