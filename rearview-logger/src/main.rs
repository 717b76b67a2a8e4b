use std::time::Duration;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_graceful_shutdown::{SubsystemBuilder, SubsystemHandle, Toplevel};

use rearview_logger::clock::SessionClock;
use rearview_logger::processor::PassProcessor;
use rearview_logger::reporter::{FileReporter, ReporterOptions};
use rearview_logger::settings::Settings;
use rearview_logger::source::FeedSource;
use rearview_logger::Cli;

// Samples waiting for the processor; the feed blocks when full
const SAMPLE_QUEUE_LEN: usize = 1024;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&config_path)
        .map_err(|e| miette::miette!("{:#}", e))?
        .unwrap_or_default();

    let identity = settings
        .resolve_identity(cli.sticker_id.as_deref())
        .into_diagnostic()?;
    match &identity.bluetooth_address {
        Some(address) => log::info!(
            "Using radar {} at Bluetooth address {}",
            identity.sticker_id,
            address
        ),
        None => log::info!("Using radar {}", identity.sticker_id),
    }
    settings.remember(&identity);
    if let Err(e) = settings.save(&config_path) {
        log::error!("Could not save settings: {:#}", e);
    }

    let config = settings.pass_config();
    config.validate().into_diagnostic()?;
    log::debug!("Pass configuration: {:?}", config);

    let clock = SessionClock::start();
    let reporter = FileReporter::new(
        ReporterOptions {
            data_file: cli.data_file.clone(),
            stream_file: cli.write_stream.then(|| cli.stream_file.clone()),
            print_stream: cli.print_stream,
        },
        clock,
    )
    .into_diagnostic()?;

    let (tx, rx) = mpsc::channel(SAMPLE_QUEUE_LEN);
    let source = FeedSource::new(&cli.input, clock, tx);
    let processor = PassProcessor::new(config, clock, reporter);
    let runtime = cli.runtime;

    Toplevel::new(move |s| async move {
        s.start(SubsystemBuilder::new("feed", move |subsys: SubsystemHandle| {
            source.run(subsys)
        }));
        s.start(SubsystemBuilder::new(
            "processor",
            move |subsys: SubsystemHandle| async move {
                processor.run(rx, subsys.on_shutdown_requested()).await?;
                // Nothing left to do once the feed is exhausted
                subsys.request_shutdown();
                Ok::<(), anyhow::Error>(())
            },
        ));
        if let Some(runtime) = runtime {
            s.start(SubsystemBuilder::new(
                "runtime",
                move |subsys: SubsystemHandle| async move {
                    tokio::select! {
                        _ = subsys.on_shutdown_requested() => {},
                        _ = sleep(runtime) => {
                            log::info!("Run time of {:?} reached", runtime);
                            subsys.request_shutdown();
                        }
                    }
                    Ok::<(), anyhow::Error>(())
                },
            ));
        }
    })
    .catch_signals()
    .handle_shutdown_requests(SHUTDOWN_TIMEOUT)
    .await
    .map_err(Into::into)
}
