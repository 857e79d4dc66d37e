//! # Telemetry Replay CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Dataset and configuration loading
//! - Lap/sector inspection and point-in-time snapshots
//! - Real-time playback with graceful shutdown

mod cli;
mod commands;
mod error;
mod playback;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_inspect, run_replay, run_snapshot, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry Replay CLI starting"
    );

    let result = match &cli.command {
        Commands::Inspect(args) => run_inspect(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Snapshot(args) => run_snapshot(args),
        Commands::Replay(args) => run_replay(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    // the replay command starts its own exporter when asked to
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
    })
}
