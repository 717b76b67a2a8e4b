//! Decoded sample feed
//!
//! The radar link and its wire decoding live outside this program; whatever
//! bridges the radar hands over decoded samples as JSON lines:
//!
//! ```text
//! {"slot": 1, "speed": 31.0, "distance": 62.5}
//! {"slot": 1, "speed": 32.5, "distance": 48.0, "delayMs": 250}
//! ```
//!
//! `delayMs` pauses the feed before the sample is delivered, so recorded
//! rides replay with their original pacing. Samples are stamped with the
//! session clock when they are read. Lines that do not parse are logged and
//! skipped; they are a gap in the stream, not a reason to stop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use rearview_core::{DetectionSample, Slot, Timestamp};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::clock::SessionClock;

/// One line of the sample feed
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub slot: Slot,
    pub speed: f64,
    pub distance: f64,
    #[serde(default)]
    pub delay_ms: u64,
}

impl FeedRecord {
    pub fn into_sample(self, timestamp: Timestamp) -> DetectionSample {
        DetectionSample::new(self.slot, self.speed, self.distance, timestamp)
    }
}

/// Parse a feed line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<FeedRecord>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Reads the feed and queues samples for the processor
pub struct FeedSource {
    input: PathBuf,
    clock: SessionClock,
    tx: mpsc::Sender<DetectionSample>,
}

impl FeedSource {
    pub fn new(input: &Path, clock: SessionClock, tx: mpsc::Sender<DetectionSample>) -> Self {
        FeedSource {
            input: input.to_path_buf(),
            clock,
            tx,
        }
    }

    async fn open(&self) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
        if self.input == Path::new("-") {
            log::info!("Reading samples from stdin");
            return Ok(Box::new(BufReader::new(tokio::io::stdin())));
        }
        let file = File::open(&self.input)
            .await
            .with_context(|| format!("opening sample feed {}", self.input.display()))?;
        log::info!("Reading samples from {}", self.input.display());
        Ok(Box::new(BufReader::new(file)))
    }

    /// Read until end of feed or shutdown. Dropping the sender at the end
    /// tells the processor that no more samples will come.
    pub async fn run(self, subsys: SubsystemHandle) -> anyhow::Result<()> {
        let mut lines = self.open().await?.lines();
        let mut line_no = 0u64;

        loop {
            let line = tokio::select! {
                _ = subsys.on_shutdown_requested() => {
                    log::debug!("Sample feed: shutdown");
                    return Ok(());
                },
                line = lines.next_line() => line.context("reading sample feed")?,
            };
            let Some(line) = line else {
                log::info!("End of sample feed after {} lines", line_no);
                return Ok(());
            };
            line_no += 1;

            let record = match parse_line(&line) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Sample feed line {}: skipped: {}", line_no, e);
                    continue;
                }
            };

            if record.delay_ms > 0 {
                tokio::select! {
                    _ = subsys.on_shutdown_requested() => return Ok(()),
                    _ = sleep(Duration::from_millis(record.delay_ms)) => {},
                }
            }

            let sample = record.into_sample(self.clock.now_ms());
            log::trace!("Sample feed line {}: {:?}", line_no, sample);
            if self.tx.send(sample).await.is_err() {
                log::debug!("Sample feed: processor gone");
                return Ok(());
            }
        }
    }
}
