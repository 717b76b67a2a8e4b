use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::{DATA_FILE, DATA_STREAM_FILE};

/// Length of the identifier printed on the radar's sticker
pub const STICKER_ID_LEN: usize = 9;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Rear-view radar logger", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Print the live data stream to the console
    #[arg(long, default_value_t = false)]
    pub print_stream: bool,

    /// Append the live data stream to the stream file
    #[arg(long, default_value_t = false)]
    pub write_stream: bool,

    /// Sticker ID of the radar to use (9 alphanumeric characters)
    #[arg(long, value_parser = parse_sticker_id)]
    pub sticker_id: Option<String>,

    /// Seconds to run for; runs until interrupted when absent
    #[arg(long, value_parser = parse_runtime)]
    pub runtime: Option<Duration>,

    /// Decoded sample feed, one JSON object per line ("-" reads stdin)
    #[arg(long, default_value = "-")]
    pub input: PathBuf,

    /// File receiving one JSON summary per vehicle pass
    #[arg(long, default_value = DATA_FILE)]
    pub data_file: PathBuf,

    /// File receiving the live data stream with --write-stream
    #[arg(long, default_value = DATA_STREAM_FILE)]
    pub stream_file: PathBuf,

    /// Settings file; defaults to the user configuration directory
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_sticker_id(s: &str) -> Result<String, String> {
    if s.len() != STICKER_ID_LEN || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!(
            "Sticker ID must be a {}-character alphanumeric string",
            STICKER_ID_LEN
        ));
    }
    Ok(s.to_string())
}

fn parse_runtime(s: &str) -> Result<Duration, String> {
    let seconds: f64 = s
        .parse()
        .map_err(|e| format!("Invalid runtime '{}': {}", s, e))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err("Runtime must be positive".to_string());
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("Invalid runtime '{}': {}", s, e))
}
