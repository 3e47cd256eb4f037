//! `platform-event-stream` CLI entry point.
//!
//! Provides `replay` (run the adapter over a recorded subscription and print
//! each record as a JSON line) and `check-config` (validate configuration).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_stream::StreamExt;
use tracing::{debug, info};

use platform_event_stream::config::StreamConfig;
use platform_event_stream::logging::{self, LoggingGuard};
use platform_event_stream::source::replay::ReplaySource;
use platform_event_stream::{AuthenticationParams, EventStreamAdapter, TracingLogger};

/// Pull-based stream over a platform event subscription.
#[derive(Parser)]
#[command(name = "platform-event-stream", version, about)]
struct Cli {
    /// Config file. Defaults to `$PES_CONFIG_PATH` or `./event-stream.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write daily-rotated JSON logs to this directory.
    #[arg(long, global = true)]
    json_logs: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Replay a JSON-lines recording through the adapter.
    Replay {
        /// Recording to play back.
        #[arg(long)]
        script: PathBuf,

        /// Topic name; overrides the config file.
        #[arg(long)]
        event_name: Option<String>,

        /// Seconds between checks for a failed setup while no records arrive.
        #[arg(long, default_value_t = 5)]
        idle_check_secs: u64,
    },
    /// Load and validate the configuration, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StreamConfig::load_from(path)?,
        None => StreamConfig::load()?,
    };
    let _logging_guard = init_logging(&config, cli.json_logs.as_deref())?;

    match cli.command {
        Command::Replay {
            script,
            event_name,
            idle_check_secs,
        } => {
            handle_replay(
                config,
                &script,
                event_name,
                Duration::from_secs(idle_check_secs),
            )
            .await
        }
        Command::CheckConfig => handle_check_config(&config),
    }
}

/// Console logging always; JSON files when a directory is given on the
/// command line or in the config.
fn init_logging(
    config: &StreamConfig,
    json_logs: Option<&Path>,
) -> anyhow::Result<Option<LoggingGuard>> {
    let level = config.logging.level.as_str();
    match json_logs.or(config.logging.json_dir.as_deref()) {
        Some(dir) => Ok(Some(logging::init_production(dir, level)?)),
        None => {
            logging::init_cli(level);
            Ok(None)
        }
    }
}

/// Play a recording through the adapter, printing records to stdout.
async fn handle_replay(
    mut config: StreamConfig,
    script: &Path,
    event_name: Option<String>,
    idle_check: Duration,
) -> anyhow::Result<()> {
    if let Some(name) = event_name {
        config.event_name = Some(name);
    }
    if config.authentication.is_none() {
        debug!("no credentials configured; replay does not check them");
        config.authentication = Some(AuthenticationParams::Token {
            access_token: "replay".to_owned(),
            instance_url: "replay://local".to_owned(),
        });
    }

    let source = ReplaySource::open(script)
        .with_context(|| format!("failed to load recording {}", script.display()))?;
    info!(signals = source.len(), script = %script.display(), "replaying recording");

    let options = config.into_options(Some(Arc::new(TracingLogger)))?;
    let mut events = EventStreamAdapter::new(options, &source)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut records: u64 = 0;
    loop {
        match tokio::time::timeout(idle_check, events.next()).await {
            Ok(Some(Ok(record))) => {
                let line = serde_json::to_string(&record).context("failed to encode record")?;
                writeln!(out, "{line}").context("failed to write record")?;
                records = records.saturating_add(1);
            }
            Ok(Some(Err(err))) => {
                out.flush().context("failed to flush output")?;
                return Err(anyhow::Error::new(err).context("event stream failed"));
            }
            Ok(None) => break,
            Err(_) => {
                if let Some(err) = events.setup_error() {
                    anyhow::bail!("event stream setup failed: {err}");
                }
                debug!(state = ?events.state(), "no records yet, still waiting");
            }
        }
    }
    out.flush().context("failed to flush output")?;

    info!(records, topic = events.topic(), "event stream ended");
    Ok(())
}

/// Validate configuration and report the result.
fn handle_check_config(config: &StreamConfig) -> anyhow::Result<()> {
    config.validate().context("configuration is incomplete")?;
    info!(
        event_name = config.event_name.as_deref().unwrap_or_default(),
        environment = ?config.connection.environment,
        "configuration is valid"
    );
    println!("configuration ok");
    Ok(())
}
