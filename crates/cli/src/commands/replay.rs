//! `replay` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::load_input;
use crate::cli::ReplayArgs;
use crate::playback::{PlaybackRunner, RunnerConfig};

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    let input = load_input(&args.input)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)
            .context("Failed to start metrics endpoint")?;
    }

    let mut playback = input.config.playback.clone();
    if let Some(speed) = args.speed {
        playback.speed = speed;
    }
    if args.loop_playback {
        playback.loop_playback = true;
    }

    if args.live && playback.loop_playback {
        warn!("--loop with --live restarts before live samples arrive");
    }

    let config = RunnerConfig {
        circuit: input.profile(),
        raw: input.raw,
        repair: input.config.repair,
        playback,
        from_ms: args.from,
        max_wall: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        live: args.live,
    };

    info!(
        source = %input.source,
        speed = config.playback.speed,
        frame_rate_hz = config.playback.frame_rate_hz,
        loop_playback = config.playback.loop_playback,
        "Starting replay"
    );

    let stats = PlaybackRunner::new(config)
        .run(shutdown_signal())
        .await
        .with_context(|| format!("Replay of {} failed", input.source))?;

    stats.print_summary();
    info!(
        frames = stats.frame_metrics.total_frames,
        generations = stats.generations_applied,
        "Replay completed"
    );
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
