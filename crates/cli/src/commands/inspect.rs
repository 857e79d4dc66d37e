//! `inspect` command implementation.

use anyhow::{Context, Result};
use contracts::{
    CircuitProfile, EnrichedDataset, EnrichedEntity, RepairReport, SectorBests, SessionAggregate,
    Stint,
};
use replay_engine::ReplayEngine;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use super::{format_lap_time, load_input};
use crate::cli::InspectArgs;

/// Inspection report for JSON output
#[derive(Serialize)]
struct InspectReport<'a> {
    source: &'a str,
    race_name: &'a str,
    year: u16,
    circuit: &'a str,
    circuit_profile: CircuitProfile,
    default_circuit: bool,
    aggregate: &'a SessionAggregate,
    entities: Vec<EntityReport<'a>>,
}

#[derive(Serialize)]
struct EntityReport<'a> {
    id: &'a str,
    name: &'a str,
    team: &'a str,
    laps: usize,
    #[serde(with = "contracts::finite_or_null")]
    best_lap: f64,
    personal_bests: SectorBests,
    #[serde(skip_serializing_if = "Option::is_none")]
    theoretical_best: Option<f64>,
    stints: &'a [Stint],
    pit_stops: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    provisional_lap: Option<u32>,
    repair: RepairReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    lap_times: Option<&'a BTreeMap<u32, f64>>,
}

/// Execute the `inspect` command
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let input = load_input(&args.input)?;
    let engine = ReplayEngine::new(input.config.repair.clone(), input.profile());

    let enriched = engine
        .build(&input.raw)
        .with_context(|| format!("Failed to aggregate {}", input.source))?;

    info!(
        entities = enriched.entities.len(),
        max_lap = enriched.aggregate.max_lap,
        "Dataset inspected"
    );

    if args.json {
        let report = build_report(&enriched, &input.source, input.uses_default_circuit(), args);
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize inspect report")?;
        println!("{}", json);
    } else {
        print_report(&enriched, input.uses_default_circuit(), args);
    }

    Ok(())
}

fn pit_stops_of(enriched: &EnrichedDataset, entity: &EnrichedEntity) -> usize {
    enriched
        .aggregate
        .pit_stop_events
        .iter()
        .filter(|p| p.entity == entity.id)
        .count()
}

fn build_report<'a>(
    enriched: &'a EnrichedDataset,
    source: &'a str,
    default_circuit: bool,
    args: &InspectArgs,
) -> InspectReport<'a> {
    let entities = enriched
        .entities
        .iter()
        .map(|e| EntityReport {
            id: e.id.as_str(),
            name: &e.name,
            team: &e.team,
            laps: e.lap_count(),
            best_lap: e.personal_best_lap,
            personal_bests: e.personal_bests,
            theoretical_best: e.personal_bests.theoretical_best(),
            stints: &e.stints,
            pit_stops: pit_stops_of(enriched, e),
            provisional_lap: e.provisional_lap,
            repair: e.repair,
            lap_times: args.laps.then_some(&e.lap_times),
        })
        .collect();

    InspectReport {
        source,
        race_name: &enriched.race_name,
        year: enriched.year,
        circuit: &enriched.circuit,
        circuit_profile: enriched.circuit_profile,
        default_circuit,
        aggregate: &enriched.aggregate,
        entities,
    }
}

fn print_report(enriched: &EnrichedDataset, default_circuit: bool, args: &InspectArgs) {
    let agg = &enriched.aggregate;
    let profile = &enriched.circuit_profile;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Session Inspection                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🏁 {} {} ({})", enriched.year, enriched.race_name, enriched.circuit);
    println!(
        "   ├─ Circuit profile: {:.0} m, S1 {:.0} m, S2 {:.0} m{}",
        profile.lap_length,
        profile.sector_boundaries.s1_end,
        profile.sector_boundaries.s2_end,
        if default_circuit { " (default)" } else { "" }
    );
    println!("   ├─ Calculated track length: {:.0} m", agg.calculated_track_length);
    println!("   ├─ Laps: {}", agg.max_lap);
    println!("   ├─ Duration: {}", format_lap_time(agg.max_timestamp));
    println!("   ├─ Session best lap: {}", format_lap_time(agg.session_best_lap_time));
    println!(
        "   ├─ Session best sectors: {} / {} / {}",
        format_lap_time(agg.session_bests.s1),
        format_lap_time(agg.session_bests.s2),
        format_lap_time(agg.session_bests.s3)
    );
    println!("   └─ Pit stops: {}", agg.pit_stop_events.len());

    println!("\n🏎  Entities ({})", enriched.entities.len());
    for (i, entity) in enriched.entities.iter().enumerate() {
        let is_last = i == enriched.entities.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child = if is_last { "   " } else { "│  " };

        println!("   {} {} {} ({})", prefix, entity.id, entity.name, entity.team);
        println!(
            "   {}  ├─ Laps: {}{}",
            child,
            entity.lap_count(),
            entity
                .provisional_lap
                .map(|lap| format!(" (lap {lap} provisional)"))
                .unwrap_or_default()
        );
        println!(
            "   {}  ├─ Best lap: {}  sectors {} / {} / {}",
            child,
            format_lap_time(entity.personal_best_lap),
            format_lap_time(entity.personal_bests.s1),
            format_lap_time(entity.personal_bests.s2),
            format_lap_time(entity.personal_bests.s3)
        );
        let stints: Vec<String> = entity
            .stints
            .iter()
            .map(|s| format!("{} x{}", s.compound, s.lap_count))
            .collect();
        println!("   {}  ├─ Stints: {}", child, stints.join(", "));
        if entity.repair.resets > 0 || entity.repair.clamped_samples > 0 {
            println!(
                "   {}  ├─ Repaired: {} resets, {} clamped samples",
                child, entity.repair.resets, entity.repair.clamped_samples
            );
        }
        println!(
            "   {}  └─ Pit stops: {}",
            child,
            pit_stops_of(enriched, entity)
        );

        if args.laps {
            for (lap, time) in &entity.lap_times {
                println!("   {}       lap {:>3}: {}", child, lap, format_lap_time(*time));
            }
        }
    }

    println!();
}
