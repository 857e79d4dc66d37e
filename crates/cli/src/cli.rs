//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Replay - lap/sector analysis and playback of recorded races
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-replay",
    author,
    version,
    about = "Race telemetry replay engine",
    long_about = "Loads a recorded race, repairs recorder timestamp resets, derives lap, \n\
                  sector, pit and stint data, and replays the session at any speed with \n\
                  per-frame interpolated snapshots."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_REPLAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_REPLAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and aggregate a dataset, then print laps and session bests
    Inspect(InspectArgs),

    /// Check a dataset and engine configuration without aggregating
    Validate(ValidateArgs),

    /// Print interpolated snapshots at one point in time
    Snapshot(SnapshotArgs),

    /// Play the session back in real time
    Replay(ReplayArgs),
}

/// Input selection shared by every command
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the recorded dataset (JSON)
    #[arg(
        short,
        long,
        env = "TELEMETRY_REPLAY_DATASET",
        required_unless_present = "mock"
    )]
    pub dataset: Option<PathBuf>,

    /// Use a generated mock session instead of a dataset file
    #[arg(long, conflicts_with = "dataset")]
    pub mock: bool,

    /// Engine configuration file (TOML or JSON)
    #[arg(short, long, env = "TELEMETRY_REPLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Circuit profile file (JSON or TOML); overrides the config's [circuit]
    #[arg(long, env = "TELEMETRY_REPLAY_CIRCUIT")]
    pub circuit: Option<PathBuf>,
}

/// Arguments for the `inspect` command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show every lap time
    #[arg(long)]
    pub laps: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `snapshot` command
#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Session time in milliseconds
    #[arg(long, allow_negative_numbers = true)]
    pub at: f64,

    /// Only this entity (default: all)
    #[arg(short, long)]
    pub entity: Option<String>,
}

/// Arguments for the `replay` command
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Playback speed multiplier (overrides the config)
    #[arg(long, env = "TELEMETRY_REPLAY_SPEED")]
    pub speed: Option<f64>,

    /// Start position in milliseconds
    #[arg(long, default_value = "0")]
    pub from: f64,

    /// Stop after this many wall-clock seconds (0 = until the end)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Loop at the end of the session (overrides the config)
    #[arg(long = "loop")]
    pub loop_playback: bool,

    /// Stream the second half of the recording in as live samples
    #[arg(long)]
    pub live: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_REPLAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
