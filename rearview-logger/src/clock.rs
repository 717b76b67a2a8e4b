use std::time::Instant;

use chrono::{DateTime, Local, TimeDelta};
use rearview_core::Timestamp;

/// Monotonic session clock shared by the sample source and the processor.
///
/// Core timestamps are milliseconds since the session started; the wall
/// clock captured at start maps them back to local time for output.
#[derive(Clone, Copy, Debug)]
pub struct SessionClock {
    start: Instant,
    start_wall: DateTime<Local>,
}

impl SessionClock {
    pub fn start() -> Self {
        SessionClock {
            start: Instant::now(),
            start_wall: Local::now(),
        }
    }

    pub fn now_ms(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }

    /// Local wall-clock time of a session timestamp
    pub fn wall_time(&self, timestamp: Timestamp) -> DateTime<Local> {
        self.start_wall + TimeDelta::milliseconds(timestamp as i64)
    }

    /// Format used for stream lines and summary records
    pub fn format(&self, timestamp: Timestamp) -> String {
        self.wall_time(timestamp)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}
