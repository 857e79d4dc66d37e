//! Ingestion pipeline main entry

use contracts::{
    EntityId, RaceDataset, RepairConfig, RepairReport, ReplayError, Sample, Timestamped,
    TrackStatusEvent, WeatherEvent,
};
use tracing::{debug, info, instrument, warn};

use crate::repair::{is_monotonic, repair};
use crate::validate::validate_dataset;

/// One competitor after timestamp repair
#[derive(Debug, Clone)]
pub struct RepairedEntity {
    pub id: EntityId,
    pub name: String,
    pub team: String,
    pub team_color: Option<String>,
    /// Non-decreasing in `t` (under the default jitter policy)
    pub samples: Vec<Sample>,
    pub report: RepairReport,
}

/// Dataset after validation and repair, ready for aggregation
#[derive(Debug, Clone)]
pub struct IngestedDataset {
    pub race_name: String,
    pub year: u16,
    pub circuit: String,
    /// Sorted by `t`
    pub weather: Vec<WeatherEvent>,
    /// Sorted by `t`
    pub track_status: Vec<TrackStatusEvent>,
    pub entities: Vec<RepairedEntity>,
    pub stats: IngestionStats,
}

/// Counters for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Entities ingested
    pub entities: usize,

    /// Samples ingested
    pub samples: usize,

    /// Recording-segment resets repaired
    pub resets: u32,

    /// Jittered samples clamped
    pub clamped_samples: u32,

    /// Entities whose repaired timestamps are still not sorted
    pub unordered_entities: usize,
}

/// Validate and repair a raw dataset
///
/// The raw dataset is only read; every output vector is a fresh copy.
///
/// # Errors
/// Any load-boundary violation (see [`validate_dataset`]).
#[instrument(
    name = "ingestion_ingest",
    skip(raw, config),
    fields(race = %raw.race_name, entities = raw.entities.len())
)]
pub fn ingest(raw: &RaceDataset, config: &RepairConfig) -> Result<IngestedDataset, ReplayError> {
    validate_dataset(raw)?;

    let mut stats = IngestionStats::default();
    let entities: Vec<RepairedEntity> = raw
        .entities
        .iter()
        .map(|record| {
            let (samples, report) = repair(&record.samples, config);
            if report.resets > 0 || report.clamped_samples > 0 {
                debug!(
                    entity = %record.id,
                    resets = report.resets,
                    clamped = report.clamped_samples,
                    "timestamps repaired"
                );
                metrics::counter!("replay_timestamp_resets_total", "entity" => record.id.to_string())
                    .increment(u64::from(report.resets));
            }

            // only reachable with JitterPolicy::Preserve
            if !is_monotonic(&samples) {
                warn!(
                    entity = %record.id,
                    "timestamps left out of order; exact-time snapshots may be interpolated"
                );
                stats.unordered_entities += 1;
            }

            stats.entities += 1;
            stats.samples += samples.len();
            stats.resets += report.resets;
            stats.clamped_samples += report.clamped_samples;

            RepairedEntity {
                id: record.id.clone(),
                name: record.name.clone(),
                team: record.team.clone(),
                team_color: record.team_color.clone(),
                samples,
                report,
            }
        })
        .collect();

    metrics::counter!("replay_ingested_samples_total").increment(stats.samples as u64);

    info!(
        entities = stats.entities,
        samples = stats.samples,
        resets = stats.resets,
        clamped = stats.clamped_samples,
        "dataset ingested"
    );

    Ok(IngestedDataset {
        race_name: raw.race_name.clone(),
        year: raw.year,
        circuit: raw.circuit.clone(),
        weather: sorted_by_time(&raw.weather),
        track_status: sorted_by_time(&raw.track_status),
        entities,
        stats,
    })
}

/// Stable copy of a sparse stream ordered by timestamp
fn sorted_by_time<E: Timestamped + Clone>(events: &[E]) -> Vec<E> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EntityRecord, JitterPolicy};

    fn raw_dataset() -> RaceDataset {
        RaceDataset {
            race_name: "Test GP".into(),
            year: 2024,
            circuit: "Test".into(),
            weather: vec![
                WeatherEvent {
                    t: 60_000.0,
                    air_temp: 22.0,
                    ..Default::default()
                },
                WeatherEvent {
                    t: 0.0,
                    air_temp: 21.0,
                    ..Default::default()
                },
            ],
            track_status: vec![],
            entities: vec![EntityRecord {
                id: "VER".into(),
                name: "Max Verstappen".into(),
                team: "Red Bull Racing".into(),
                team_color: None,
                samples: vec![
                    Sample::at(49_000.0, 1, 0.0),
                    Sample::at(50_000.0, 1, 100.0),
                    Sample::at(200.0, 1, 200.0),
                ],
            }],
        }
    }

    #[test]
    fn test_ingest_repairs_and_sorts() {
        let raw = raw_dataset();
        let ingested = ingest(&raw, &RepairConfig::default()).unwrap();

        assert_eq!(ingested.entities[0].samples[2].t, 51_200.0);
        assert_eq!(ingested.entities[0].report.resets, 1);
        assert_eq!(ingested.weather[0].t, 0.0);
        assert_eq!(ingested.weather[1].t, 60_000.0);
        assert_eq!(
            ingested.stats,
            IngestionStats {
                entities: 1,
                samples: 3,
                resets: 1,
                clamped_samples: 0,
                unordered_entities: 0,
            }
        );

        // input untouched
        assert_eq!(raw.entities[0].samples[2].t, 200.0);
        assert_eq!(raw.weather[0].t, 60_000.0);
    }

    #[test]
    fn test_preserved_jitter_counted_as_unordered() {
        let raw = RaceDataset {
            entities: vec![EntityRecord {
                id: "VER".into(),
                samples: vec![
                    Sample::at(0.0, 1, 0.0),
                    Sample::at(1000.0, 1, 100.0),
                    Sample::at(900.0, 1, 90.0),
                ],
                ..Default::default()
            }],
            ..Default::default()
        };

        let preserve = RepairConfig {
            jitter_policy: JitterPolicy::Preserve,
            ..Default::default()
        };
        assert_eq!(ingest(&raw, &preserve).unwrap().stats.unordered_entities, 1);

        let clamped = ingest(&raw, &RepairConfig::default()).unwrap();
        assert_eq!(clamped.stats.unordered_entities, 0);
        assert_eq!(clamped.stats.clamped_samples, 1);
    }

    #[test]
    fn test_ingest_rejects_empty() {
        let raw = RaceDataset::default();
        assert!(matches!(
            ingest(&raw, &RepairConfig::default()),
            Err(ReplayError::EmptyDataset)
        ));
    }
}
