//! Output sinks for accepted samples and pass summaries

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rearview_core::{CalibratedSample, PassSummary, Slot};
use serde::Serialize;

use crate::clock::SessionClock;

/// Sink for the events produced by the pass engine.
///
/// The engine makes no assumption about what a reporter does with them.
pub trait Reporter: Send {
    fn on_sample(&mut self, sample: &CalibratedSample) -> io::Result<()>;

    fn on_summary(&mut self, summary: &PassSummary) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One line of the data file
#[derive(Debug, Serialize)]
pub struct SummaryRecord {
    /// Local time the pass started
    pub timestamp: String,
    pub slot: Slot,
    pub max: f64,
    #[serde(rename = "95% max")]
    pub trimmed_max: f64,
    pub average: f64,
    pub count: usize,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    /// `[speed, distance]` in arrival order
    pub data: Vec<(f64, f64)>,
}

impl SummaryRecord {
    pub fn new(summary: &PassSummary, clock: &SessionClock) -> Self {
        SummaryRecord {
            timestamp: clock.format(summary.start_time),
            slot: summary.slot,
            max: summary.max_speed,
            trimmed_max: summary.trimmed_max_speed,
            average: summary.average_speed,
            count: summary.sample_count,
            duration_ms: summary.duration_ms(),
            data: summary
                .points
                .iter()
                .map(|p| (p.speed, p.distance))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReporterOptions {
    pub data_file: PathBuf,
    pub stream_file: Option<PathBuf>,
    pub print_stream: bool,
}

/// Appends summaries to the data file and optionally streams samples to
/// the console and the stream file.
pub struct FileReporter {
    clock: SessionClock,
    data_file: PathBuf,
    stream: Option<BufWriter<File>>,
    print_stream: bool,
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl FileReporter {
    pub fn new(options: ReporterOptions, clock: SessionClock) -> io::Result<Self> {
        let stream = match &options.stream_file {
            Some(path) => Some(BufWriter::new(open_append(path)?)),
            None => None,
        };
        Ok(FileReporter {
            clock,
            data_file: options.data_file,
            stream,
            print_stream: options.print_stream,
        })
    }

    fn stream_line(&self, sample: &CalibratedSample) -> String {
        format!(
            "{} slot={} speed={:.1} distance={:.1}",
            self.clock.format(sample.timestamp),
            sample.slot,
            sample.speed,
            sample.distance
        )
    }
}

impl Reporter for FileReporter {
    fn on_sample(&mut self, sample: &CalibratedSample) -> io::Result<()> {
        if !self.print_stream && self.stream.is_none() {
            return Ok(());
        }
        let line = self.stream_line(sample);
        if self.print_stream {
            println!("{}", line);
        }
        if let Some(stream) = &mut self.stream {
            writeln!(stream, "{}", line)?;
        }
        Ok(())
    }

    fn on_summary(&mut self, summary: &PassSummary) -> io::Result<()> {
        let record = SummaryRecord::new(summary, &self.clock);
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        // Opened per pass so every summary is on disk as soon as it is known
        let mut file = open_append(&self.data_file)?;
        file.write_all(line.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(stream) = &mut self.stream {
            stream.flush()?;
        }
        Ok(())
    }
}
