//! SessionLoader - one-shot background aggregation tasks

use std::sync::Arc;
use std::time::Instant;

use contracts::{CircuitProfile, EnrichedDataset, RaceDataset, ReplayError};
use replay_engine::ReplayEngine;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Completion of one background load
#[derive(Debug)]
pub struct LoadOutcome {
    /// Generation the load was submitted as
    pub generation: u64,
    /// Raw dataset the load was built from
    pub raw: Arc<RaceDataset>,
    pub result: Result<EnrichedDataset, ReplayError>,
    /// Submit to completion (ms)
    pub elapsed_ms: f64,
}

/// Spawns ingestion + aggregation off the caller's thread
///
/// Every submission gets the next generation id and exactly one
/// [`LoadOutcome`] on the loader's channel. Tasks share nothing with the
/// caller beyond the `Arc`'d raw input.
pub struct SessionLoader {
    engine: ReplayEngine,
    tx: mpsc::UnboundedSender<LoadOutcome>,
    generation: u64,
}

impl SessionLoader {
    /// Create a loader and the receiver its outcomes arrive on
    pub fn new(engine: ReplayEngine) -> (Self, mpsc::UnboundedReceiver<LoadOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                tx,
                generation: 0,
            },
            rx,
        )
    }

    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    /// Latest generation handed out
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reserve the next generation id
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Submit a load; returns its generation id
    ///
    /// Must be called from within a Tokio runtime. `circuit` overrides the
    /// engine's profile for this load only.
    #[instrument(name = "session_loader_submit", skip(self, raw, circuit), fields(race = %raw.race_name))]
    pub fn submit(&mut self, raw: Arc<RaceDataset>, circuit: Option<CircuitProfile>) -> u64 {
        let generation = self.next_generation();
        let engine = self.engine.clone().with_profile(circuit);
        let tx = self.tx.clone();
        let started = Instant::now();

        tokio::spawn(async move {
            let task_raw = Arc::clone(&raw);
            let joined = tokio::task::spawn_blocking(move || engine.build(&task_raw)).await;

            let result = joined.unwrap_or_else(|e| {
                Err(ReplayError::AggregationFailed {
                    generation,
                    message: e.to_string(),
                })
            });

            let outcome = LoadOutcome {
                generation,
                raw,
                result,
                elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
            };

            if tx.send(outcome).is_err() {
                debug!(generation, "session store dropped, load result discarded");
            }
        });

        debug!(generation, "load submitted");
        generation
    }
}
