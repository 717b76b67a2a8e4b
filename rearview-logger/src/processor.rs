//! Ingestion loop
//!
//! The only task that touches pass state. Samples from the feed queue, idle
//! ticks and the shutdown request are merged with `select!` into a single
//! ordered stream for the [`PassEngine`]. However the loop ends (end of feed,
//! run-time limit, Ctrl-C) the remaining queued samples are handled and every
//! open pass is flushed before it returns.

use std::future::Future;
use std::time::Duration;

use rearview_core::{
    DataQuality, DetectionSample, DropReason, EngineInput, PassConfig, PassEngine, PassEvent,
};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::clock::SessionClock;
use crate::reporter::Reporter;

/// How often open passes are checked for the idle timeout
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct PassProcessor<R> {
    config: PassConfig,
    clock: SessionClock,
    reporter: R,
    tick_interval: Duration,
}

impl<R: Reporter> PassProcessor<R> {
    /// The configuration must already be validated
    pub fn new(config: PassConfig, clock: SessionClock, reporter: R) -> Self {
        PassProcessor {
            config,
            clock,
            reporter,
            tick_interval: TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Process samples until the feed closes or `shutdown` completes
    pub async fn run<F>(
        self,
        mut rx: mpsc::Receiver<DetectionSample>,
        shutdown: F,
    ) -> anyhow::Result<DataQuality>
    where
        F: Future<Output = ()>,
    {
        let PassProcessor {
            config,
            clock,
            reporter,
            tick_interval,
        } = self;
        let mut dispatcher = Dispatcher {
            reporter,
            warned_malformed: false,
            stream_failed: false,
            error: None,
        };
        let mut engine = PassEngine::new(&config);

        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        // Idle sweeps are not starved by a busy feed
        while dispatcher.error.is_none() {
            let input = tokio::select! {
                biased;

                _ = &mut shutdown => {
                    log::debug!("Processor: shutdown requested");
                    break;
                },
                _ = ticker.tick() => EngineInput::Tick(clock.now_ms()),
                sample = rx.recv() => match sample {
                    Some(sample) => EngineInput::Sample(sample),
                    None => {
                        log::debug!("Processor: sample feed closed");
                        break;
                    }
                },
            };

            for event in engine.handle(input) {
                dispatcher.dispatch(event);
            }
        }

        // Samples already queued are part of the run
        rx.close();
        while let Ok(sample) = rx.try_recv() {
            for event in engine.handle(EngineInput::Sample(sample)) {
                dispatcher.dispatch(event);
            }
        }

        let open = engine.open_passes();
        if open > 0 {
            log::info!("Flushing {} open pass(es)", open);
        }
        for event in engine.finish() {
            dispatcher.dispatch(event);
        }
        if let Err(e) = dispatcher.reporter.flush() {
            dispatcher.fail(anyhow::Error::new(e).context("flushing reporter output"));
        }

        let quality = engine.quality();
        log::info!(
            "Processed {} sample(s) into {} pass(es); dropped {} malformed and {} outside the admission window",
            quality.accepted,
            quality.passes,
            quality.malformed,
            quality.out_of_window
        );
        match dispatcher.error {
            Some(e) => Err(e),
            None => Ok(quality),
        }
    }
}

/// Routes engine events to the reporter. A failed stream write disables the
/// stream; a failed summary write ends the run after every open pass has
/// been summarized, and the first such error is returned.
struct Dispatcher<R> {
    reporter: R,
    warned_malformed: bool,
    stream_failed: bool,
    error: Option<anyhow::Error>,
}

impl<R: Reporter> Dispatcher<R> {
    fn fail(&mut self, e: anyhow::Error) {
        log::error!("{:#}", e);
        if self.error.is_none() {
            self.error = Some(e);
        }
    }

    fn dispatch(&mut self, event: PassEvent) {
        match event {
            PassEvent::Sample(sample) => {
                log::trace!("{:?}", sample);
                if self.stream_failed {
                    return;
                }
                if let Err(e) = self.reporter.on_sample(&sample) {
                    log::error!("Writing sample stream failed, stream disabled: {}", e);
                    self.stream_failed = true;
                }
            }
            PassEvent::Summary(summary) => {
                log::info!(
                    "Pass {} on slot {}: {} samples, max {:.1}, trimmed max {:.1}, average {:.1}",
                    summary.id,
                    summary.slot,
                    summary.sample_count,
                    summary.max_speed,
                    summary.trimmed_max_speed,
                    summary.average_speed
                );
                if let Err(e) = self.reporter.on_summary(&summary) {
                    let e = anyhow::Error::new(e)
                        .context(format!("writing summary of pass {}", summary.id));
                    self.fail(e);
                }
            }
            PassEvent::Dropped(reason @ DropReason::Malformed(_)) => {
                if self.warned_malformed {
                    log::debug!("Dropped {}", reason);
                } else {
                    log::warn!("Dropped {} (further drops logged at debug level)", reason);
                    self.warned_malformed = true;
                }
            }
            PassEvent::Dropped(reason) => {
                log::trace!("Dropped {}", reason);
            }
        }
    }
}
