//! `snapshot` command implementation.

use anyhow::{Context, Result};
use contracts::{TrackStatusEvent, WeatherEvent};
use replay_engine::ReplayEngine;
use serde::Serialize;
use session::{EntitySnapshot, ReplaySession, SessionStore};
use tracing::info;

use super::load_input;
use crate::cli::SnapshotArgs;
use crate::error::CliError;

/// Point-in-time view for JSON output
#[derive(Serialize)]
struct SnapshotReport<'a> {
    time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    weather: Option<&'a WeatherEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    track_status: Option<&'a TrackStatusEvent>,
    snapshots: Vec<EntitySnapshot>,
}

/// Execute the `snapshot` command
pub fn run_snapshot(args: &SnapshotArgs) -> Result<()> {
    let input = load_input(&args.input)?;
    let profile = input.profile();

    let mut store = SessionStore::new(ReplayEngine::new(input.config.repair.clone(), profile));
    let session = store
        .load_blocking(input.raw, Some(profile))
        .with_context(|| format!("Failed to load {}", input.source))?;

    let report = build_report(&session, args.at, args.entity.as_deref())?;
    info!(
        time_ms = args.at,
        snapshots = report.snapshots.len(),
        "Snapshot taken"
    );

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize snapshot")?;
    println!("{}", json);
    Ok(())
}

fn build_report<'a>(
    session: &'a ReplaySession,
    time_ms: f64,
    entity: Option<&str>,
) -> Result<SnapshotReport<'a>, CliError> {
    let snapshots = match entity {
        Some(id) => {
            let sample = session.get_snapshot(id, time_ms).map_err(|_| {
                let available: Vec<String> = session
                    .dataset()
                    .entities
                    .iter()
                    .map(|e| e.id.to_string())
                    .collect();
                CliError::unknown_entity(id, &available)
            })?;
            sample
                .map(|sample| EntitySnapshot {
                    entity: id.into(),
                    sample,
                })
                .into_iter()
                .collect()
        }
        None => session.snapshot_all(time_ms),
    };

    Ok(SnapshotReport {
        time_ms,
        weather: session.get_weather_at(time_ms),
        track_status: session.get_track_status_at(time_ms),
        snapshots,
    })
}
