mod config;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracker::types::Trajectory;
use tracing_subscriber::prelude::*;

const METRICS_PREFIX: &str = "windborne";

#[derive(Parser)]
#[command(version, about = "Balloon flight paths from the Windborne hourly snapshots")]
struct Cli {
    /// YAML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config_file_path: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the flight path API
    Serve(ServeArgs),
    /// Fetch all snapshots once and print the trajectories as JSON
    Fetch {
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Overrides the configured listener host
    #[arg(long, env = "WINDBORNE_HOST")]
    host: Option<String>,
    /// Overrides the configured listener port
    #[arg(long, env = "WINDBORNE_PORT")]
    port: Option<u16>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("tracker error: {0}")]
    Tracker(#[from] tracker::TrackerError),
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderInstalled,
    #[error("could not serialize trajectories: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = match &cli.config_file_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Must outlive the runtime so pending events are flushed on exit.
    let _sentry_guard = init_logging(config.logging.as_ref());

    if let Some(metrics_config) = &config.metrics {
        init_metrics(metrics_config)?;
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = rt.block_on(run(cli.command, config));
    if let Err(e) = &result {
        tracing::error!("Exiting: {e}");
    }
    result
}

async fn run(command: CliCommand, config: Config) -> Result<(), CliError> {
    let mut tracker_config = config.tracker;

    match command {
        CliCommand::Serve(args) => {
            if let Some(host) = args.host {
                tracker_config.listener.host = host;
            }
            if let Some(port) = args.port {
                tracker_config.listener.port = port;
            }
            tracker::run(tracker_config).await?;
        }
        CliCommand::Fetch { pretty } => {
            let pipeline = tracker::build_pipeline(&tracker_config)?;
            let trajectories = pipeline.run().await;
            println!("{}", render(&trajectories, pretty)?);
        }
    }

    Ok(())
}

fn render(trajectories: &[Trajectory], pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(trajectories)
    } else {
        serde_json::to_string(trajectories)
    }
}

fn init_logging(config: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let guard = config.map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // stdout is reserved for `fetch` output
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_layer)
        .init();

    guard
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| CliError::RecorderInstalled)?;
    shared::metrics_defs::describe_all(tracker::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}
