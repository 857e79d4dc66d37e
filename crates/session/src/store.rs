//! SessionStore - the caller-side session model
//!
//! Holds the currently applied [`ReplaySession`] and swaps it atomically
//! when the newest load completes. Results of superseded loads are dropped
//! on arrival; failed loads leave the previous session in place.

use std::sync::Arc;
use std::time::Instant;

use contracts::{CircuitProfile, EnrichedDataset, RaceDataset, ReplayError, Sample};
use replay_engine::ReplayEngine;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::loader::{LoadOutcome, SessionLoader};
use crate::session::ReplaySession;

/// What [`SessionStore::poll`] observed
#[derive(Debug)]
pub enum PollEvent {
    /// The newest load was applied
    Applied { generation: u64 },
    /// A superseded load finished and was discarded
    Stale { generation: u64 },
    /// The newest load failed; the previous session is still current
    Failed { generation: u64, error: ReplayError },
}

/// Session model with background loading and live append
pub struct SessionStore {
    loader: SessionLoader,
    rx: mpsc::UnboundedReceiver<LoadOutcome>,
    current: Option<Arc<ReplaySession>>,
    /// Raw input of the newest submitted load
    latest_raw: Option<Arc<RaceDataset>>,
    latest_circuit: Option<CircuitProfile>,
    /// Newest generation whose outcome has been handled
    resolved: u64,
}

impl SessionStore {
    pub fn new(engine: ReplayEngine) -> Self {
        let (loader, rx) = SessionLoader::new(engine);
        Self {
            loader,
            rx,
            current: None,
            latest_raw: None,
            latest_circuit: None,
            resolved: 0,
        }
    }

    /// Currently applied session
    pub fn current(&self) -> Option<Arc<ReplaySession>> {
        self.current.clone()
    }

    /// Newest submitted generation
    pub fn latest_generation(&self) -> u64 {
        self.loader.generation()
    }

    /// Whether the newest submitted load is still running
    pub fn is_loading(&self) -> bool {
        self.resolved != self.loader.generation()
    }

    /// Start a background load; returns its generation id
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self, raw: RaceDataset, circuit: Option<CircuitProfile>) -> u64 {
        let raw = Arc::new(raw);
        self.latest_raw = Some(Arc::clone(&raw));
        self.latest_circuit = circuit;
        self.loader.submit(raw, circuit)
    }

    /// Append live samples to one entity and re-aggregate in the background
    ///
    /// Builds on the newest submitted raw dataset, so appends issued before
    /// an earlier load completes are not lost. The new samples become
    /// queryable once the returned generation is applied.
    ///
    /// # Errors
    /// [`ReplayError::NoSession`] before any load was submitted;
    /// [`ReplayError::UnknownEntity`] for ids not in the dataset.
    #[instrument(name = "session_store_append", skip(self, samples), fields(samples = samples.len()))]
    pub fn append_samples(&mut self, entity: &str, samples: Vec<Sample>) -> Result<u64, ReplayError> {
        let base = self.latest_raw.as_ref().ok_or(ReplayError::NoSession)?;
        if base.entity(entity).is_none() {
            return Err(ReplayError::unknown_entity(entity));
        }
        if samples.is_empty() {
            return Ok(self.loader.generation());
        }

        let mut raw = RaceDataset::clone(base);
        if let Some(record) = raw.entities.iter_mut().find(|e| e.id == entity) {
            record.samples.extend(samples);
        }

        let circuit = self.latest_circuit;
        Ok(self.submit(raw, circuit))
    }

    /// Drain finished loads without blocking
    pub fn poll(&mut self) -> Vec<PollEvent> {
        let mut events = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            events.push(self.handle(outcome));
        }
        events
    }

    /// Wait for the next finished load
    ///
    /// Returns `None` only if the loader's channel closed.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        let outcome = self.rx.recv().await?;
        Some(self.handle(outcome))
    }

    /// Wait until the newest submitted load resolves
    ///
    /// # Errors
    /// The newest load's error, or [`ReplayError::NoSession`] if nothing
    /// has ever been applied.
    pub async fn wait_for_latest(&mut self) -> Result<Arc<ReplaySession>, ReplayError> {
        while self.is_loading() {
            match self.next_event().await {
                Some(PollEvent::Failed { error, .. }) => return Err(error),
                Some(_) => {}
                None => break,
            }
        }
        self.current.clone().ok_or(ReplayError::NoSession)
    }

    /// Build and apply a load on the calling thread
    ///
    /// Supersedes any background load still in flight.
    ///
    /// # Errors
    /// The load-boundary error; the previous session stays current.
    pub fn load_blocking(
        &mut self,
        raw: RaceDataset,
        circuit: Option<CircuitProfile>,
    ) -> Result<Arc<ReplaySession>, ReplayError> {
        let generation = self.loader.next_generation();
        let raw = Arc::new(raw);
        self.latest_raw = Some(Arc::clone(&raw));
        self.latest_circuit = circuit;

        let started = Instant::now();
        let engine = self.loader.engine().clone().with_profile(circuit);
        let result = engine.build(&raw);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.resolved = generation;

        match result {
            Ok(dataset) => Ok(self.apply(generation, dataset, raw, elapsed_ms)),
            Err(error) => {
                self.fail(generation, &error);
                Err(error)
            }
        }
    }

    fn handle(&mut self, outcome: LoadOutcome) -> PollEvent {
        let generation = outcome.generation;
        if generation != self.loader.generation() {
            debug!(
                generation,
                latest = self.loader.generation(),
                "stale load result discarded"
            );
            observability::record_stale_discarded();
            return PollEvent::Stale { generation };
        }

        self.resolved = generation;
        match outcome.result {
            Ok(dataset) => {
                self.apply(generation, dataset, outcome.raw, outcome.elapsed_ms);
                PollEvent::Applied { generation }
            }
            Err(error) => {
                self.fail(generation, &error);
                PollEvent::Failed { generation, error }
            }
        }
    }

    fn apply(
        &mut self,
        generation: u64,
        dataset: EnrichedDataset,
        raw: Arc<RaceDataset>,
        elapsed_ms: f64,
    ) -> Arc<ReplaySession> {
        let entities = dataset.entities.len();
        let samples = dataset.entities.iter().map(|e| e.samples.len()).sum();

        observability::record_load_latency_ms(elapsed_ms);
        observability::record_session_applied(generation, entities, samples);
        info!(generation, entities, samples, elapsed_ms, "session applied");

        let session = Arc::new(ReplaySession::new(generation, dataset, raw));
        self.current = Some(Arc::clone(&session));
        session
    }

    fn fail(&mut self, generation: u64, error: &ReplayError) {
        warn!(generation, error = %error, "load failed, keeping previous session");
        observability::record_load_failed(error.kind());

        // later appends build on what is actually being served
        self.latest_raw = self.current.as_ref().map(|s| Arc::clone(s.raw()));
        self.latest_circuit = self.current.as_ref().map(|s| *s.circuit());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EntityRecord;
    use ingestion::MockSession;

    fn raw() -> RaceDataset {
        MockSession::with_entities(&["VER", "LEC"]).generate()
    }

    #[tokio::test]
    async fn test_submit_and_apply() {
        let mut store = SessionStore::new(ReplayEngine::default());
        assert!(store.current().is_none());

        let generation = store.submit(raw(), None);
        assert!(store.is_loading());

        let session = store.wait_for_latest().await.unwrap();
        assert_eq!(session.generation(), generation);
        assert!(!store.is_loading());
        assert_eq!(session.dataset().entities.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_result_discarded() {
        let mut store = SessionStore::new(ReplayEngine::default());

        let first = store.submit(raw(), None);
        let second = store.submit(MockSession::with_entities(&["NOR"]).generate(), None);

        let mut stale = Vec::new();
        let mut applied = Vec::new();
        while applied.is_empty() {
            match store.next_event().await.unwrap() {
                PollEvent::Stale { generation } => stale.push(generation),
                PollEvent::Applied { generation } => applied.push(generation),
                PollEvent::Failed { error, .. } => panic!("unexpected failure: {error}"),
            }
        }

        assert_eq!(applied, [second]);
        let session = store.current().unwrap();
        assert_eq!(session.dataset().entities[0].id, "NOR");

        // the first load is dropped whenever it finishes
        if stale.is_empty() {
            match store.next_event().await.unwrap() {
                PollEvent::Stale { generation } => assert_eq!(generation, first),
                other => panic!("expected stale, got {other:?}"),
            }
        }
        assert_eq!(store.current().unwrap().generation(), second);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous() {
        let mut store = SessionStore::new(ReplayEngine::default());
        store.load_blocking(raw(), None).unwrap();

        store.submit(RaceDataset::default(), None);
        let err = store.wait_for_latest().await.unwrap_err();
        assert!(matches!(err, ReplayError::EmptyDataset));

        let session = store.current().unwrap();
        assert_eq!(session.generation(), 1);

        // appends build on the served dataset again
        let generation = store
            .append_samples("VER", vec![Sample::at(1.0e6, 6, 30_000.0)])
            .unwrap();
        assert_eq!(generation, 3);
        let session = store.wait_for_latest().await.unwrap();
        assert_eq!(session.generation(), 3);
    }

    #[tokio::test]
    async fn test_append_becomes_queryable_after_reaggregation() {
        let mut store = SessionStore::new(ReplayEngine::default());
        let before = store.load_blocking(raw(), None).unwrap();
        let end = before.duration_ms();

        let tail = vec![
            Sample::at(end + 1000.0, 6, 25_100.0),
            Sample::at(end + 2000.0, 6, 25_200.0),
        ];
        store.append_samples("VER", tail).unwrap();

        // not visible until the new generation lands
        let snap = before.get_snapshot("VER", end + 2000.0).unwrap().unwrap();
        assert!(snap.t < end + 2000.0);

        let after = store.wait_for_latest().await.unwrap();
        let snap = after.get_snapshot("VER", end + 2000.0).unwrap().unwrap();
        assert_eq!(snap.lap, 6);
        assert_eq!(snap.dist, 25_200.0);
        assert_eq!(after.duration_ms(), end + 2000.0);
    }

    #[tokio::test]
    async fn test_appends_accumulate_before_apply() {
        let mut store = SessionStore::new(ReplayEngine::default());
        let before = store.load_blocking(raw(), None).unwrap();
        let end = before.duration_ms();

        store
            .append_samples("LEC", vec![Sample::at(end + 500.0, 6, 25_050.0)])
            .unwrap();
        store
            .append_samples("LEC", vec![Sample::at(end + 900.0, 6, 25_090.0)])
            .unwrap();

        let after = store.wait_for_latest().await.unwrap();
        let lec = after.entity("LEC").unwrap();
        assert_eq!(lec.samples.len(), before.entity("LEC").unwrap().samples.len() + 2);
    }

    #[test]
    fn test_append_errors() {
        let mut store = SessionStore::new(ReplayEngine::default());
        assert!(matches!(
            store.append_samples("VER", vec![Sample::default()]),
            Err(ReplayError::NoSession)
        ));

        store.load_blocking(raw(), None).unwrap();
        assert!(matches!(
            store.append_samples("HAM", vec![Sample::default()]),
            Err(ReplayError::UnknownEntity { .. })
        ));
        assert_eq!(store.append_samples("VER", vec![]).unwrap(), 1);
    }

    #[test]
    fn test_load_blocking_rejects_malformed() {
        let mut store = SessionStore::new(ReplayEngine::default());
        let raw = RaceDataset {
            entities: vec![EntityRecord {
                id: " ".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(store.load_blocking(raw, None).is_err());
        assert!(store.current().is_none());
        assert!(!store.is_loading());
    }
}
