//! Playback runner - drives the clock and queries one frame at a time.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{CircuitProfile, PlaybackConfig, RaceDataset, RepairConfig};
use ingestion::{MockLiveFeed, SampleBatch};
use observability::{record_frame_metrics, FrameTiming, PlaybackMetricsAggregator};
use replay_engine::ReplayEngine;
use session::{ClockState, PlaybackClock, PollEvent, ReplaySession, SessionStore};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::PlaybackStats;
use crate::commands::format_lap_time;
use crate::error::{CliError, Result};

/// Live feed batch size (samples)
const LIVE_BATCH_SIZE: usize = 40;

/// Live feed interval between batches
const LIVE_BATCH_INTERVAL: Duration = Duration::from_millis(250);

/// Interval between leaderboard log lines
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub raw: RaceDataset,
    pub repair: RepairConfig,
    pub circuit: CircuitProfile,
    pub playback: PlaybackConfig,

    /// Start position (ms)
    pub from_ms: f64,

    /// Stop after this much wall time (None = until the end)
    pub max_wall: Option<Duration>,

    /// Stream the second half of every entity in as live samples
    pub live: bool,
}

enum LoopEvent {
    Frame,
    Batch(Option<SampleBatch>),
    Shutdown,
}

/// Frame loop over a [`SessionStore`]
pub struct PlaybackRunner {
    config: RunnerConfig,
}

impl PlaybackRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run until the session ends, the wall-time limit passes, or `shutdown`
    /// resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PlaybackStats> {
        let started = Instant::now();
        let RunnerConfig {
            raw,
            repair,
            circuit,
            playback,
            from_ms,
            max_wall,
            live,
        } = self.config;

        if !(playback.frame_rate_hz.is_finite() && playback.frame_rate_hz > 0.0) {
            return Err(CliError::playback(format!(
                "frame rate must be positive, got {}",
                playback.frame_rate_hz
            )));
        }
        if !(playback.speed.is_finite() && playback.speed > 0.0) {
            return Err(CliError::playback(format!(
                "speed must be positive, got {}",
                playback.speed
            )));
        }

        let (initial, tail) = if live {
            let (head, tail) = split_for_live(&raw);
            (head, Some(tail))
        } else {
            (raw, None)
        };

        let mut stats = PlaybackStats {
            frame_metrics: PlaybackMetricsAggregator::new(1000.0 / playback.frame_rate_hz),
            ..Default::default()
        };

        // initial load goes through the background path like every reload
        let mut store = SessionStore::new(ReplayEngine::new(repair, circuit));
        store.submit(initial, Some(circuit));
        let mut session = store
            .wait_for_latest()
            .await
            .map_err(|e| CliError::load("session", e))?;
        stats.generations_applied += 1;

        let mut clock = PlaybackClock::from_config(session.duration_ms(), &playback);
        clock.seek(from_ms);
        clock.play();

        info!(
            race = %session.dataset().race_name,
            duration = %format_lap_time(session.duration_ms()),
            speed = clock.speed(),
            from = %format_lap_time(clock.position_ms()),
            live,
            "Playback started"
        );

        let feed = tail.map(|tail| MockLiveFeed::new(tail, LIVE_BATCH_SIZE, LIVE_BATCH_INTERVAL));
        let mut feed_rx = feed.as_ref().map(|feed| feed.start(16));

        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(1.0 / playback.frame_rate_hz));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);
        let mut last_frame = Instant::now();
        let mut last_report = Instant::now();
        let mut frame_id = 0u64;

        loop {
            let event = tokio::select! {
                _ = interval.tick() => LoopEvent::Frame,
                batch = next_batch(&mut feed_rx) => LoopEvent::Batch(batch),
                _ = &mut shutdown => LoopEvent::Shutdown,
            };

            match event {
                LoopEvent::Frame => {}
                LoopEvent::Batch(Some(batch)) => {
                    match store.append_samples(batch.entity.as_str(), batch.samples) {
                        Ok(generation) => {
                            stats.batches_appended += 1;
                            debug!(entity = %batch.entity, generation, "live batch appended");
                        }
                        Err(e) => warn!(entity = %batch.entity, error = %e, "live batch rejected"),
                    }
                    continue;
                }
                LoopEvent::Batch(None) => {
                    debug!("live feed finished");
                    feed_rx = None;
                    continue;
                }
                LoopEvent::Shutdown => {
                    warn!("Received shutdown signal, stopping playback...");
                    break;
                }
            }

            for event in store.poll() {
                match event {
                    PollEvent::Applied { .. } => {
                        if let Some(current) = store.current() {
                            session = current;
                            clock.set_duration(session.duration_ms());
                            // new samples extend the session past a paused end
                            if clock.state() == ClockState::Paused
                                && clock.position_ms() < clock.duration_ms()
                            {
                                clock.play();
                            }
                        }
                        stats.generations_applied += 1;
                    }
                    PollEvent::Stale { .. } => stats.stale_discarded += 1,
                    PollEvent::Failed { generation, error } => {
                        stats.load_failures += 1;
                        warn!(generation, error = %error, "reload failed");
                    }
                }
            }

            let now = Instant::now();
            let wall_delta = now - last_frame;
            last_frame = now;
            let position = clock.tick(wall_delta);

            let query_start = Instant::now();
            let snapshots = session.snapshot_all(position);
            let query_us = query_start.elapsed().as_secs_f64() * 1e6;

            frame_id += 1;
            let timing = FrameTiming {
                frame_id,
                playback_ms: position,
                wall_delta_ms: wall_delta.as_secs_f64() * 1000.0,
                query_us,
                entities: snapshots.len(),
            };
            record_frame_metrics(&timing);
            stats.frame_metrics.update(&timing);

            if last_report.elapsed() >= REPORT_INTERVAL {
                last_report = Instant::now();
                log_leaderboard(&session, position);
            }

            if max_wall.is_some_and(|max| started.elapsed() >= max) {
                info!("Wall-time limit reached");
                break;
            }

            let feed_done = feed_rx.is_none();
            if clock.state() == ClockState::Paused && feed_done && !store.is_loading() {
                info!("End of session reached");
                break;
            }
        }

        if let Some(feed) = &feed {
            feed.stop();
        }

        stats.duration = started.elapsed();
        stats.final_position_ms = clock.position_ms();
        Ok(stats)
    }
}

/// Next live batch, or never when there is no feed
async fn next_batch(rx: &mut Option<mpsc::Receiver<SampleBatch>>) -> Option<SampleBatch> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn log_leaderboard(session: &Arc<ReplaySession>, position: f64) {
    let standings = session.standings(position);
    let order: Vec<String> = standings
        .iter()
        .take(10)
        .map(|s| {
            if s.is_pit {
                format!("{}:{}(PIT)", s.position, s.entity)
            } else {
                format!("{}:{}", s.position, s.entity)
            }
        })
        .collect();

    info!(
        position = %format_lap_time(position),
        lap = standings.first().map(|s| s.lap).unwrap_or(0),
        track_status = session
            .get_track_status_at(position)
            .map(|s| s.message.as_str())
            .unwrap_or("-"),
        order = %order.join(" "),
        "Leaderboard"
    );
}

/// Split every entity in two: the first half loads up front, the rest
/// arrives live
fn split_for_live(raw: &RaceDataset) -> (RaceDataset, RaceDataset) {
    let mut head = raw.clone();
    let mut tail = raw.clone();

    for (h, t) in head.entities.iter_mut().zip(tail.entities.iter_mut()) {
        let split = h.samples.len().div_ceil(2);
        t.samples = h.samples.split_off(split);
    }
    tail.entities.retain(|e| !e.samples.is_empty());

    (head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::MockSession;

    #[test]
    fn test_split_for_live() {
        let raw = MockSession::with_entities(&["VER", "LEC"]).generate();
        let (head, tail) = split_for_live(&raw);

        assert_eq!(head.entities.len(), 2);
        assert_eq!(tail.entities.len(), 2);
        assert_eq!(
            head.entities[0].samples.len() + tail.entities[0].samples.len(),
            raw.entities[0].samples.len()
        );
        let last_head = head.entities[0].samples.last().unwrap().t;
        let first_tail = tail.entities[0].samples[0].t;
        assert!(last_head < first_tail);
    }

    #[tokio::test]
    async fn test_runs_to_end() {
        let config = RunnerConfig {
            raw: MockSession::with_entities(&["VER"]).generate(),
            repair: RepairConfig::default(),
            circuit: CircuitProfile::default(),
            playback: PlaybackConfig {
                speed: 64.0,
                ..Default::default()
            },
            from_ms: 440_000.0,
            max_wall: Some(Duration::from_secs(30)),
            live: false,
        };

        let stats = PlaybackRunner::new(config)
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.generations_applied, 1);
        assert!(stats.frame_metrics.total_frames > 0);
        assert!(stats.final_position_ms >= 440_000.0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let config = RunnerConfig {
            raw: MockSession::with_entities(&["VER"]).generate(),
            repair: RepairConfig::default(),
            circuit: CircuitProfile::default(),
            playback: PlaybackConfig::default(),
            from_ms: 0.0,
            max_wall: None,
            live: false,
        };

        let stats = PlaybackRunner::new(config)
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert!(stats.final_position_ms < 10_000.0);
    }

    #[tokio::test]
    async fn test_rejects_zero_speed() {
        let config = RunnerConfig {
            raw: MockSession::with_entities(&["VER"]).generate(),
            repair: RepairConfig::default(),
            circuit: CircuitProfile::default(),
            playback: PlaybackConfig {
                speed: 0.0,
                ..Default::default()
            },
            from_ms: 0.0,
            max_wall: None,
            live: false,
        };

        let result = PlaybackRunner::new(config).run(std::future::pending()).await;
        assert!(matches!(result, Err(CliError::Playback { .. })));
    }
}
