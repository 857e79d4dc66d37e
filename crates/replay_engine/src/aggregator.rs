//! Lap / sector aggregation
//!
//! One forward pass per entity over the repaired samples. Sector boundaries
//! are tested against the distance covered since the first sample of the
//! lap, so recordings with whole-session cumulative `dist` are timed
//! correctly.

use std::collections::BTreeMap;
use std::sync::Arc;

use contracts::{
    CircuitProfile, Compound, EnrichedDataset, EnrichedEntity, EntityId, PitStopEvent, Sample,
    SectorBests, SectorTimes, SessionAggregate, Stint,
};
use ingestion::{IngestedDataset, RepairedEntity};
use tracing::{debug, instrument};

/// Per-lap running state
#[derive(Debug, Clone, Copy)]
struct LapState {
    lap: u32,
    start_time: f64,
    start_dist: f64,
    max_dist: f64,
    s1_cross: Option<f64>,
    s2_cross: Option<f64>,
}

impl LapState {
    fn open(sample: &Sample) -> Self {
        Self {
            lap: sample.lap,
            start_time: sample.t,
            start_dist: sample.dist,
            max_dist: sample.dist,
            s1_cross: None,
            s2_cross: None,
        }
    }

    /// Lap 0 is the formation lap and is never timed
    fn is_timed(&self) -> bool {
        self.lap > 0
    }

    fn within_lap(&self) -> f64 {
        self.max_dist - self.start_dist
    }
}

/// Result of aggregating one entity
#[derive(Debug)]
pub(crate) struct EntityAggregate {
    pub entity: EnrichedEntity,
    pub pit_stops: Vec<PitStopEvent>,
    /// Within-lap distance of the first lap closed by a transition
    pub first_lap_distance: Option<f64>,
    pub max_lap: u32,
    pub max_timestamp: Option<f64>,
}

/// Single-pass accumulator for one entity
struct EntityAccumulator<'a> {
    id: &'a EntityId,
    profile: &'a CircuitProfile,
    lap_times: BTreeMap<u32, f64>,
    sector_times: BTreeMap<u32, SectorTimes>,
    bests: SectorBests,
    best_lap: f64,
    lap_compounds: Vec<(u32, Compound)>,
    pit_stops: Vec<PitStopEvent>,
    first_lap_distance: Option<f64>,
    in_pit: bool,
    current: Option<LapState>,
}

impl<'a> EntityAccumulator<'a> {
    fn new(id: &'a EntityId, profile: &'a CircuitProfile) -> Self {
        Self {
            id,
            profile,
            lap_times: BTreeMap::new(),
            sector_times: BTreeMap::new(),
            bests: SectorBests::default(),
            best_lap: f64::INFINITY,
            lap_compounds: Vec::new(),
            pit_stops: Vec::new(),
            first_lap_distance: None,
            in_pit: false,
            current: None,
        }
    }

    fn push(&mut self, sample: &Sample) {
        match self.current {
            None => {
                self.in_pit = sample.is_pit;
                self.start_lap(sample);
            }
            Some(state) => {
                if sample.is_pit && !self.in_pit {
                    self.pit_stops.push(PitStopEvent {
                        entity: self.id.clone(),
                        lap: sample.lap,
                        timestamp: sample.t,
                    });
                }
                self.in_pit = sample.is_pit;

                // a lap number going backwards is recorder noise, not a new lap
                if sample.lap > state.lap {
                    self.close_lap(state, sample.t, true);
                    if state.is_timed() && self.first_lap_distance.is_none() {
                        let distance = state.within_lap();
                        if distance > 0.0 {
                            self.first_lap_distance = Some(distance);
                        }
                    }
                    self.start_lap(sample);
                }
            }
        }

        self.check_sectors(sample);
    }

    fn start_lap(&mut self, sample: &Sample) {
        let state = LapState::open(sample);
        if state.is_timed() {
            self.lap_compounds.push((state.lap, sample.compound));
        }
        self.current = Some(state);
    }

    fn check_sectors(&mut self, sample: &Sample) {
        let Some(state) = self.current.as_mut() else {
            return;
        };
        state.max_dist = state.max_dist.max(sample.dist);
        if !state.is_timed() {
            return;
        }

        let within = sample.dist - state.start_dist;
        let bounds = self.profile.sector_boundaries;

        if state.s1_cross.is_none() && within >= bounds.s1_end {
            state.s1_cross = Some(sample.t);
            self.sector_times.entry(state.lap).or_default().s1 =
                Some(duration(sample.t, state.start_time));
        }
        if state.s2_cross.is_none() && within >= bounds.s2_end {
            state.s2_cross = Some(sample.t);
            let from = state.s1_cross.unwrap_or(state.start_time);
            self.sector_times.entry(state.lap).or_default().s2 = Some(duration(sample.t, from));
        }
    }

    /// Close `state` at `end_time`, recording lap time and S3
    ///
    /// Only `confirmed` laps (closed by a lap transition) compete for the
    /// best lap.
    fn close_lap(&mut self, state: LapState, end_time: f64, confirmed: bool) {
        if !state.is_timed() {
            return;
        }

        let lap_time = duration(end_time, state.start_time);
        self.lap_times.insert(state.lap, lap_time);
        if confirmed {
            self.best_lap = self.best_lap.min(lap_time);
        }

        self.sector_times.entry(state.lap).or_default().s3 =
            Some(duration(end_time, state.s2_cross.unwrap_or(state.start_time)));
    }

    fn finish(mut self, record: &RepairedEntity) -> EntityAggregate {
        let mut provisional_lap = None;
        if let (Some(state), Some(last)) = (self.current.take(), record.samples.last()) {
            // single-sample laps have no span to estimate from
            if state.is_timed() && last.t > state.start_time {
                self.close_lap(state, last.t, false);
                provisional_lap = Some(state.lap);
            }
        }

        // sectors of a lap that never closed still count
        for sectors in self.sector_times.values() {
            self.bests.absorb(sectors);
        }

        let max_lap = record.samples.iter().map(|s| s.lap).max().unwrap_or(0);
        let max_timestamp = record.samples.iter().map(|s| s.t).reduce(f64::max);

        EntityAggregate {
            entity: EnrichedEntity {
                id: record.id.clone(),
                name: record.name.clone(),
                team: record.team.clone(),
                team_color: record.team_color.clone(),
                samples: Arc::from(record.samples.as_slice()),
                lap_times: self.lap_times,
                sector_times: self.sector_times,
                personal_bests: self.bests,
                personal_best_lap: self.best_lap,
                stints: build_stints(&self.lap_compounds),
                provisional_lap,
                repair: record.report,
            },
            pit_stops: self.pit_stops,
            first_lap_distance: self.first_lap_distance,
            max_lap,
            max_timestamp,
        }
    }
}

/// Non-negative difference of two timestamps
fn duration(end: f64, start: f64) -> f64 {
    (end - start).max(0.0)
}

/// Group consecutive laps sharing a compound
fn build_stints(lap_compounds: &[(u32, Compound)]) -> Vec<Stint> {
    let mut stints: Vec<Stint> = Vec::new();
    for &(lap, compound) in lap_compounds {
        match stints.last_mut() {
            Some(stint) if stint.compound == compound => stint.lap_count += 1,
            _ => stints.push(Stint {
                compound,
                stint: stints.len() as u32 + 1,
                start_lap: lap,
                lap_count: 1,
            }),
        }
    }
    stints
}

/// Aggregate one entity's repaired samples
pub(crate) fn aggregate_entity(record: &RepairedEntity, profile: &CircuitProfile) -> EntityAggregate {
    let mut acc = EntityAccumulator::new(&record.id, profile);
    for sample in &record.samples {
        acc.push(sample);
    }
    acc.finish(record)
}

/// Build the enriched dataset from an ingested one
///
/// Pure: the same input always produces the same output, and nothing from
/// the input is aliased into the result.
#[instrument(
    name = "replay_engine_aggregate",
    skip(ingested, profile),
    fields(race = %ingested.race_name, entities = ingested.entities.len())
)]
pub fn aggregate(ingested: &IngestedDataset, profile: &CircuitProfile) -> EnrichedDataset {
    let mut session = SessionAggregate::default();
    let mut track_length = None;
    let mut max_timestamp: Option<f64> = None;
    let mut entities = Vec::with_capacity(ingested.entities.len());

    for record in &ingested.entities {
        let agg = aggregate_entity(record, profile);

        debug!(
            entity = %agg.entity.id,
            laps = agg.entity.lap_count(),
            best_lap = agg.entity.personal_best_lap,
            pit_stops = agg.pit_stops.len(),
            stints = agg.entity.stints.len(),
            "entity aggregated"
        );

        session.max_lap = session.max_lap.max(agg.max_lap);
        if let Some(t) = agg.max_timestamp {
            max_timestamp = Some(max_timestamp.map_or(t, |m| m.max(t)));
        }
        session.session_best_lap_time = session
            .session_best_lap_time
            .min(agg.entity.personal_best_lap);
        session.session_bests.s1 = session.session_bests.s1.min(agg.entity.personal_bests.s1);
        session.session_bests.s2 = session.session_bests.s2.min(agg.entity.personal_bests.s2);
        session.session_bests.s3 = session.session_bests.s3.min(agg.entity.personal_bests.s3);
        session.pit_stop_events.extend(agg.pit_stops);
        if track_length.is_none() {
            track_length = agg.first_lap_distance;
        }

        entities.push(agg.entity);
    }

    session.max_timestamp = max_timestamp.unwrap_or(0.0);
    session.calculated_track_length = track_length.unwrap_or(profile.lap_length);

    EnrichedDataset {
        race_name: ingested.race_name.clone(),
        year: ingested.year,
        circuit: ingested.circuit.clone(),
        weather: ingested.weather.clone(),
        track_status: ingested.track_status.clone(),
        entities,
        aggregate: session,
        circuit_profile: *profile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RepairReport, SectorBoundaries};

    fn entity(id: &str, samples: Vec<Sample>) -> RepairedEntity {
        RepairedEntity {
            id: id.into(),
            name: id.to_string(),
            team: "Team".into(),
            team_color: None,
            samples,
            report: RepairReport::default(),
        }
    }

    fn profile(lap_length: f64, s1_end: f64, s2_end: f64) -> CircuitProfile {
        CircuitProfile {
            lap_length,
            sector_boundaries: SectorBoundaries { s1_end, s2_end },
        }
    }

    fn pit(t: f64, lap: u32, is_pit: bool) -> Sample {
        Sample {
            is_pit,
            ..Sample::at(t, lap, t)
        }
    }

    #[test]
    fn test_lap_and_sector_scenario() {
        let record = entity(
            "VER",
            vec![
                Sample::at(0.0, 1, 0.0),
                Sample::at(1000.0, 1, 400.0),
                Sample::at(2000.0, 2, 0.0),
            ],
        );
        let agg = aggregate_entity(&record, &profile(5000.0, 300.0, 3337.0));

        assert_eq!(agg.entity.lap_times.get(&1), Some(&2000.0));
        assert_eq!(agg.entity.sector_times[&1].s1, Some(1000.0));
        assert_eq!(agg.entity.sector_times[&1].s2, None);
        assert_eq!(agg.entity.sector_times[&1].s3, Some(2000.0));
        // lap 2 has a single sample, nothing to estimate
        assert_eq!(agg.entity.lap_times.get(&2), None);
        assert!(!agg.entity.sector_times.contains_key(&2));
        assert_eq!(agg.entity.provisional_lap, None);
        assert_eq!(agg.entity.personal_best_lap, 2000.0);
        assert_eq!(agg.first_lap_distance, Some(400.0));
    }

    #[test]
    fn test_cumulative_distance_sectors() {
        // second lap starts at 5000 m cumulative
        let samples = vec![
            Sample::at(0.0, 1, 0.0),
            Sample::at(30_000.0, 1, 1500.0),
            Sample::at(60_000.0, 1, 3500.0),
            Sample::at(90_000.0, 2, 5000.0),
            Sample::at(119_000.0, 2, 6450.0),
            Sample::at(149_000.0, 2, 8420.0),
            Sample::at(178_000.0, 3, 10_000.0),
        ];
        let agg = aggregate_entity(&entity("LEC", samples), &CircuitProfile::default());
        let lap2 = agg.entity.sector_times[&2];

        assert_eq!(lap2.s1, Some(29_000.0));
        assert_eq!(lap2.s2, Some(30_000.0));
        assert_eq!(lap2.s3, Some(29_000.0));
        assert_eq!(agg.entity.lap_times[&2], 88_000.0);
        assert_eq!(agg.entity.personal_bests.s1, 29_000.0);
    }

    #[test]
    fn test_pit_edges() {
        let flags = [false, false, true, true, false, true];
        let samples = flags
            .iter()
            .enumerate()
            .map(|(i, &f)| pit(i as f64 * 100.0, 1, f))
            .collect();
        let agg = aggregate_entity(&entity("HAM", samples), &CircuitProfile::default());

        assert_eq!(agg.pit_stops.len(), 2);
        assert_eq!(agg.pit_stops[0].timestamp, 200.0);
        assert_eq!(agg.pit_stops[1].timestamp, 500.0);
        assert_eq!(agg.pit_stops[0].entity, "HAM");
    }

    #[test]
    fn test_starting_in_pit_is_not_an_event() {
        let samples = vec![pit(0.0, 1, true), pit(100.0, 1, true), pit(200.0, 1, false)];
        let agg = aggregate_entity(&entity("NOR", samples), &CircuitProfile::default());
        assert!(agg.pit_stops.is_empty());
    }

    #[test]
    fn test_formation_lap_untimed() {
        let samples = vec![
            Sample::at(0.0, 0, 0.0),
            Sample::at(5000.0, 0, 2000.0),
            Sample::at(10_000.0, 1, 2500.0),
            Sample::at(50_000.0, 1, 5000.0),
            Sample::at(100_000.0, 2, 7500.0),
        ];
        let agg = aggregate_entity(&entity("PIA", samples), &CircuitProfile::default());

        assert!(!agg.entity.lap_times.contains_key(&0));
        assert!(!agg.entity.sector_times.contains_key(&0));
        assert_eq!(agg.entity.lap_times[&1], 90_000.0);
        assert_eq!(agg.first_lap_distance, Some(2500.0));
        assert!(agg.entity.lap_times.keys().all(|lap| (1..=2).contains(lap)));
    }

    #[test]
    fn test_provisional_final_lap() {
        let samples = vec![
            Sample::at(0.0, 1, 0.0),
            Sample::at(90_000.0, 2, 5000.0),
            Sample::at(120_000.0, 2, 6500.0),
        ];
        let agg = aggregate_entity(&entity("VER", samples), &CircuitProfile::default());

        assert_eq!(agg.entity.provisional_lap, Some(2));
        assert_eq!(agg.entity.lap_times[&2], 30_000.0);
        assert_eq!(agg.entity.completed_laps().collect::<Vec<_>>(), vec![(1, 90_000.0)]);
        // the truncated lap is shorter but never the best lap
        assert_eq!(agg.entity.personal_best_lap, 90_000.0);
    }

    #[test]
    fn test_lap_number_regression_ignored() {
        let samples = vec![
            Sample::at(0.0, 1, 0.0),
            Sample::at(90_000.0, 2, 5000.0),
            Sample::at(95_000.0, 1, 5300.0),
            Sample::at(96_000.0, 2, 5400.0),
            Sample::at(180_000.0, 3, 10_000.0),
        ];
        let agg = aggregate_entity(&entity("VER", samples), &CircuitProfile::default());

        assert_eq!(agg.entity.lap_times[&1], 90_000.0);
        assert_eq!(agg.entity.lap_times[&2], 90_000.0);
        assert_eq!(agg.entity.personal_best_lap, 90_000.0);
        assert_eq!(agg.entity.stints.len(), 1);
        assert_eq!(agg.entity.stints[0].lap_count, 3);
    }

    #[test]
    fn test_empty_entity_defaults() {
        let agg = aggregate_entity(&entity("VER", vec![]), &CircuitProfile::default());

        assert!(agg.entity.lap_times.is_empty());
        assert!(agg.entity.sector_times.is_empty());
        assert_eq!(agg.entity.personal_best_lap, f64::INFINITY);
        assert_eq!(agg.entity.personal_bests, SectorBests::default());
        assert_eq!(agg.max_timestamp, None);
    }

    #[test]
    fn test_negative_jitter_floors_at_zero() {
        let samples = vec![Sample::at(1000.0, 1, 0.0), Sample::at(900.0, 2, 5000.0)];
        let agg = aggregate_entity(&entity("VER", samples), &CircuitProfile::default());
        assert_eq!(agg.entity.lap_times[&1], 0.0);
    }

    #[test]
    fn test_stints() {
        let compounds = [
            (1, Compound::Medium),
            (2, Compound::Medium),
            (3, Compound::Hard),
            (4, Compound::Hard),
            (5, Compound::Hard),
            (6, Compound::Soft),
        ];
        let stints = build_stints(&compounds);

        assert_eq!(stints.len(), 3);
        assert_eq!(
            stints[1],
            Stint {
                compound: Compound::Hard,
                stint: 2,
                start_lap: 3,
                lap_count: 3,
            }
        );
        assert_eq!(stints[2].lap_count, 1);
    }

    #[test]
    fn test_session_aggregate() {
        let ingested = IngestedDataset {
            race_name: "Test".into(),
            year: 2024,
            circuit: "Test".into(),
            weather: vec![],
            track_status: vec![],
            entities: vec![
                entity(
                    "VER",
                    vec![
                        Sample::at(0.0, 1, 0.0),
                        Sample::at(45_000.0, 1, 2600.0),
                        Sample::at(90_000.0, 2, 4980.0),
                        Sample::at(100_000.0, 2, 5600.0),
                    ],
                ),
                entity(
                    "LEC",
                    vec![
                        pit(0.0, 1, false),
                        pit(88_000.0, 2, true),
                        pit(95_000.0, 3, false),
                    ],
                ),
            ],
            stats: Default::default(),
        };
        let enriched = aggregate(&ingested, &CircuitProfile::default());
        let session = &enriched.aggregate;

        assert_eq!(session.max_lap, 3);
        assert_eq!(session.max_timestamp, 100_000.0);
        assert_eq!(session.session_best_lap_time, 7_000.0);
        assert_eq!(session.pit_stop_events.len(), 1);
        assert_eq!(session.pit_stop_events[0].lap, 2);
        assert_eq!(session.calculated_track_length, 2600.0);
        assert_eq!(enriched.entity("LEC").unwrap().lap_times[&2], 7_000.0);
    }

    #[test]
    fn test_track_length_fallback() {
        let ingested = IngestedDataset {
            race_name: "Test".into(),
            year: 2024,
            circuit: "Test".into(),
            weather: vec![],
            track_status: vec![],
            entities: vec![entity("VER", vec![Sample::at(0.0, 1, 0.0)])],
            stats: Default::default(),
        };
        let enriched = aggregate(&ingested, &profile(4200.0, 1000.0, 3000.0));
        assert_eq!(enriched.aggregate.calculated_track_length, 4200.0);
    }

    #[test]
    fn test_idempotent() {
        let ingested = ingestion::ingest(
            &ingestion::MockSession::with_entities(&["VER", "LEC", "NOR"]).generate(),
            &Default::default(),
        )
        .unwrap();
        let profile = CircuitProfile::default();

        let a = serde_json::to_value(aggregate(&ingested, &profile)).unwrap();
        let b = serde_json::to_value(aggregate(&ingested, &profile)).unwrap();
        assert_eq!(a, b);
    }
}
