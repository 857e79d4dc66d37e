//! ReplaySession - one immutable, fully aggregated load

use std::sync::Arc;

use contracts::{
    CircuitProfile, EnrichedDataset, EnrichedEntity, EntityId, RaceDataset, ReplayError, Sample,
    TrackStatusEvent, WeatherEvent,
};
use replay_engine::{latest_at_or_before, query};
use serde::Serialize;

/// One entity's synthesized state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub entity: EntityId,
    #[serde(flatten)]
    pub sample: Sample,
}

/// One row of a running order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    /// 1-based position
    pub position: usize,
    pub entity: EntityId,
    pub lap: u32,
    pub dist: f64,
    pub is_pit: bool,
}

/// An applied load: enriched model plus the raw input it was built from
///
/// Immutable once built and shared as `Arc<ReplaySession>`; a reload or live
/// append produces a new session instead of mutating this one.
#[derive(Debug)]
pub struct ReplaySession {
    generation: u64,
    dataset: EnrichedDataset,
    raw: Arc<RaceDataset>,
    circuit: CircuitProfile,
}

impl ReplaySession {
    pub fn new(generation: u64, dataset: EnrichedDataset, raw: Arc<RaceDataset>) -> Self {
        let circuit = dataset.circuit_profile;
        Self {
            generation,
            dataset,
            raw,
            circuit,
        }
    }

    /// Load generation this session was built for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dataset(&self) -> &EnrichedDataset {
        &self.dataset
    }

    /// Raw dataset the session was built from
    pub fn raw(&self) -> &Arc<RaceDataset> {
        &self.raw
    }

    pub fn circuit(&self) -> &CircuitProfile {
        &self.circuit
    }

    /// Session length for the playback clock (ms)
    pub fn duration_ms(&self) -> f64 {
        self.dataset.aggregate.max_timestamp
    }

    pub fn entity(&self, id: &str) -> Option<&EnrichedEntity> {
        self.dataset.entity(id)
    }

    /// Synthesized state of one entity at `time_ms`
    ///
    /// `Ok(None)` when the entity has no samples.
    ///
    /// # Errors
    /// [`ReplayError::UnknownEntity`] for ids not in the session.
    pub fn get_snapshot(&self, entity: &str, time_ms: f64) -> Result<Option<Sample>, ReplayError> {
        let record = self
            .entity(entity)
            .ok_or_else(|| ReplayError::unknown_entity(entity))?;
        Ok(query(&record.samples, time_ms))
    }

    /// Weather in effect at `time_ms`
    pub fn get_weather_at(&self, time_ms: f64) -> Option<&WeatherEvent> {
        latest_at_or_before(&self.dataset.weather, time_ms)
    }

    /// Track status in effect at `time_ms`
    pub fn get_track_status_at(&self, time_ms: f64) -> Option<&TrackStatusEvent> {
        latest_at_or_before(&self.dataset.track_status, time_ms)
    }

    /// Snapshot every entity with samples, in dataset order
    pub fn snapshot_all(&self, time_ms: f64) -> Vec<EntitySnapshot> {
        self.dataset
            .entities
            .iter()
            .filter_map(|e| {
                query(&e.samples, time_ms).map(|sample| EntitySnapshot {
                    entity: e.id.clone(),
                    sample,
                })
            })
            .collect()
    }

    /// Running order at `time_ms`, by lap then distance
    pub fn standings(&self, time_ms: f64) -> Vec<Standing> {
        let mut snapshots = self.snapshot_all(time_ms);
        snapshots.sort_by(|a, b| {
            b.sample
                .lap
                .cmp(&a.sample.lap)
                .then(b.sample.dist.total_cmp(&a.sample.dist))
        });

        snapshots
            .into_iter()
            .enumerate()
            .map(|(idx, snap)| Standing {
                position: idx + 1,
                entity: snap.entity,
                lap: snap.sample.lap,
                dist: snap.sample.dist,
                is_pit: snap.sample.is_pit,
            })
            .collect()
    }
}
