//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RaceDataset, RepairConfig};
use serde::Serialize;
use tracing::info;

use super::load_input;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<DatasetSummary>,
}

#[derive(Serialize)]
struct DatasetSummary {
    race_name: String,
    year: u16,
    entity_count: usize,
    sample_count: usize,
    weather_events: usize,
    track_status_events: usize,
    max_lap: u32,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_input(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Validation failed")
    }
}

fn validate_input(args: &ValidateArgs) -> ValidationResult {
    let source = args
        .input
        .dataset
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "mock session".to_string());

    let input = match load_input(&args.input) {
        Ok(input) => input,
        Err(e) => {
            return ValidationResult {
                valid: false,
                source,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            }
        }
    };

    info!(source = %input.source, "Validating dataset");

    if let Err(e) = ingestion::validate_dataset(&input.raw) {
        return ValidationResult {
            valid: false,
            source: input.source,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        };
    }

    let mut warnings = collect_warnings(&input.raw, &input.config.repair);
    if input.uses_default_circuit() {
        warnings.push("No circuit profile given - using the 5000 m default".to_string());
    }

    let raw = &input.raw;
    ValidationResult {
        valid: true,
        source: input.source.clone(),
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(DatasetSummary {
            race_name: raw.race_name.clone(),
            year: raw.year,
            entity_count: raw.entities.len(),
            sample_count: raw.sample_count(),
            weather_events: raw.weather.len(),
            track_status_events: raw.track_status.len(),
            max_lap: raw
                .entities
                .iter()
                .flat_map(|e| e.samples.iter().map(|s| s.lap))
                .max()
                .unwrap_or(0),
        }),
    }
}

/// Collect non-fatal dataset issues
fn collect_warnings(raw: &RaceDataset, repair: &RepairConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    for entity in &raw.entities {
        if entity.samples.is_empty() {
            warnings.push(format!("Entity '{}' has no samples", entity.id));
            continue;
        }

        let (repaired, report) = ingestion::repair(&entity.samples, repair);
        if report.resets > 0 {
            warnings.push(format!(
                "Entity '{}' has {} recorder timestamp reset(s) - will be repaired",
                entity.id, report.resets
            ));
        }
        if report.clamped_samples > 0 {
            warnings.push(format!(
                "Entity '{}' has {} out-of-order sample(s) below the reset threshold",
                entity.id, report.clamped_samples
            ));
        }
        if !ingestion::is_monotonic(&repaired) {
            warnings.push(format!(
                "Entity '{}' keeps out-of-order timestamps (jitter_policy = preserve) - \
                 snapshots at recorded times may be interpolated",
                entity.id
            ));
        }
    }

    if raw.weather.is_empty() {
        warnings.push("No weather events recorded".to_string());
    }
    if raw.track_status.is_empty() {
        warnings.push("No track status events recorded".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Dataset is valid: {}", result.source);

        if let Some(ref summary) = result.summary {
            println!("\n  Race: {} {}", summary.year, summary.race_name);
            println!("  Entities: {}", summary.entity_count);
            println!("  Samples: {}", summary.sample_count);
            println!("  Laps: {}", summary.max_lap);
            println!("  Weather events: {}", summary.weather_events);
            println!("  Track status events: {}", summary.track_status_events);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Dataset is invalid: {}", result.source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
