//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Dataset and config files through to a queryable session
//! - Live sample appends through the background loader
//! - Recorder clock resets surviving the whole pipeline

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::time::Duration;

    use config_loader::{ConfigLoader, DatasetLoader};
    use contracts::{RaceDataset, ReplayError};
    use ingestion::{MockLiveFeed, MockSession, MockSessionConfig};
    use observability::{FrameTiming, PlaybackMetricsAggregator};
    use replay_engine::ReplayEngine;
    use session::{PlaybackClock, SessionStore};

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    /// Files on disk -> loaders -> engine -> session queries
    #[tokio::test]
    async fn test_e2e_files_to_session() {
        let raw = MockSession::with_entities(&["VER", "LEC"]).generate();
        let dataset_file = write_temp(".json", &serde_json::to_string(&raw).unwrap());
        let config_file = write_temp(
            ".toml",
            r#"
[circuit]
lap_length = 5000.0
s1_end = 1400.0
s2_end = 3400.0

[playback]
speed = 4.0
"#,
        );

        let config = ConfigLoader::load_from_path(config_file.path()).unwrap();
        let loaded = DatasetLoader::load_from_path(dataset_file.path()).unwrap();
        assert_eq!(loaded.entities.len(), 2);

        let mut store = SessionStore::new(ReplayEngine::from_config(&config));
        store.submit(loaded, Some(config.circuit_profile()));
        let session = store.wait_for_latest().await.unwrap();

        let ver = session.entity("VER").unwrap();
        assert_eq!(ver.lap_times.len(), 5);
        assert_eq!(ver.provisional_lap, Some(5));
        assert_eq!(ver.stints.len(), 2);
        assert!(ver.personal_best_lap.is_finite());

        let aggregate = &session.dataset().aggregate;
        assert_eq!(aggregate.max_lap, 5);
        assert_eq!(aggregate.pit_stop_events.len(), 2);

        let mid = session.get_snapshot("LEC", 100_000.0).unwrap().unwrap();
        assert_eq!(mid.lap, 2);
        assert!(session.get_weather_at(100_000.0).is_some());
        assert_eq!(session.standings(100_000.0).len(), 2);
    }

    /// Live batches appended while a session is applied
    #[tokio::test]
    async fn test_e2e_live_append() {
        let raw = MockSession::with_entities(&["VER", "LEC"]).generate();
        let mut head = raw.clone();
        let mut tail = raw.clone();
        for (h, t) in head.entities.iter_mut().zip(tail.entities.iter_mut()) {
            t.samples = h.samples.split_off(h.samples.len() / 2);
        }

        let mut store = SessionStore::new(ReplayEngine::default());
        store.submit(head, None);
        let initial = store.wait_for_latest().await.unwrap();
        let initial_duration = initial.duration_ms();
        let initial_laps = initial.dataset().aggregate.max_lap;

        let feed = MockLiveFeed::new(tail, 25, Duration::from_millis(1));
        let mut rx = feed.start(8);
        let mut batches = 0;
        while let Some(batch) = rx.recv().await {
            store
                .append_samples(batch.entity.as_str(), batch.samples)
                .unwrap();
            batches += 1;
        }
        assert!(batches > 0);
        assert!(!feed.is_running());

        let session = store.wait_for_latest().await.unwrap();
        assert_eq!(session.generation(), store.latest_generation());
        assert!(session.duration_ms() > initial_duration);
        assert!(session.dataset().aggregate.max_lap > initial_laps);
        assert_eq!(
            session.entity("VER").unwrap().samples.len(),
            raw.entity("VER").unwrap().samples.len()
        );
    }

    /// A recorder clock reset is repaired before laps are timed
    #[tokio::test]
    async fn test_e2e_reset_repaired() {
        let raw = MockSession::new(MockSessionConfig {
            entity_ids: vec!["VER".into()],
            pit_laps: vec![],
            reset_after_lap: Some(2),
            ..Default::default()
        })
        .generate();

        let mut store = SessionStore::new(ReplayEngine::default());
        store.submit(raw, None);
        let session = store.wait_for_latest().await.unwrap();

        let ver = session.entity("VER").unwrap();
        assert_eq!(ver.repair.resets, 1);
        assert!(ver.samples.windows(2).all(|w| w[0].t <= w[1].t));
        assert!(ver.lap_times.values().all(|t| *t > 0.0));

        // clock driven over the repaired session never goes backwards
        let mut clock = PlaybackClock::new(session.duration_ms());
        let mut metrics = PlaybackMetricsAggregator::new(33.0);
        clock.set_speed(64.0);
        clock.play();
        let mut last_t = f64::NEG_INFINITY;
        for frame_id in 1..=200 {
            let position = clock.tick(Duration::from_millis(33));
            let sample = session.get_snapshot("VER", position).unwrap().unwrap();
            assert!(sample.t >= last_t);
            last_t = sample.t;
            metrics.update(&FrameTiming {
                frame_id,
                playback_ms: position,
                wall_delta_ms: 33.0,
                query_us: 1.0,
                entities: 1,
            });
        }
        assert_eq!(metrics.summary().total_frames, 200);
    }

    /// An invalid dataset file surfaces as a dataset error through the store
    #[test]
    fn test_e2e_rejects_bad_dataset() {
        let file = write_temp(".json", r#"{"raceName": "Empty", "drivers": []}"#);
        let raw: RaceDataset = DatasetLoader::load_from_path(file.path()).unwrap();

        let mut store = SessionStore::new(ReplayEngine::default());
        let err = store.load_blocking(raw, None).unwrap_err();
        assert!(matches!(err, ReplayError::EmptyDataset));
        assert!(store.current().is_none());
    }
}
