//! Replay engine: ingestion + aggregation in one call

use std::time::Instant;

use contracts::{
    CircuitProfile, EnrichedDataset, RaceDataset, RepairConfig, ReplayConfig, ReplayError,
};
use tracing::{info, instrument};

use crate::aggregator::aggregate;

/// Builds enriched datasets from raw recordings
///
/// Stateless apart from its configuration, so one engine can be cloned into
/// background tasks and reused for every load.
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    repair: RepairConfig,
    profile: CircuitProfile,
}

impl ReplayEngine {
    /// Create an engine with the given repair settings and circuit profile
    pub fn new(repair: RepairConfig, profile: CircuitProfile) -> Self {
        Self { repair, profile }
    }

    /// Create an engine from a loaded configuration
    pub fn from_config(config: &ReplayConfig) -> Self {
        Self::new(config.repair.clone(), config.circuit_profile())
    }

    /// Replace the circuit profile (`None` keeps the current one)
    pub fn with_profile(mut self, profile: Option<CircuitProfile>) -> Self {
        if let Some(profile) = profile {
            self.profile = profile;
        }
        self
    }

    pub fn profile(&self) -> &CircuitProfile {
        &self.profile
    }

    pub fn repair_config(&self) -> &RepairConfig {
        &self.repair
    }

    /// Validate, repair and aggregate a raw dataset
    ///
    /// CPU-bound; async callers should run it on a blocking thread.
    ///
    /// # Errors
    /// Returns the load-boundary error when the dataset is malformed; no
    /// partial result is produced.
    #[instrument(name = "replay_engine_build", skip(self, raw), fields(race = %raw.race_name))]
    pub fn build(&self, raw: &RaceDataset) -> Result<EnrichedDataset, ReplayError> {
        let started = Instant::now();

        let ingested = ingestion::ingest(raw, &self.repair)?;
        let enriched = aggregate(&ingested, &self.profile);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("replay_build_duration_ms").record(elapsed_ms);

        info!(
            entities = enriched.entities.len(),
            max_lap = enriched.aggregate.max_lap,
            pit_stops = enriched.aggregate.pit_stop_events.len(),
            elapsed_ms,
            "dataset enriched"
        );

        Ok(enriched)
    }
}
