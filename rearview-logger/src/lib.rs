//! Rear-view radar logger
//!
//! Hosts the [`rearview_core`] pass engine: reads decoded samples, runs the
//! single ingestion loop with idle ticks, and writes pass summaries and the
//! optional live stream.

pub mod cli;
pub mod clock;
pub mod processor;
pub mod reporter;
pub mod settings;
pub mod source;

pub use cli::Cli;

/// Name of the persisted settings file
pub const CONFIG_FILE: &str = "config.json";

/// Default file receiving pass summaries, one JSON object per line
pub const DATA_FILE: &str = "data.json";

/// Default file receiving the live sample stream
pub const DATA_STREAM_FILE: &str = "data_stream.txt";
