//! Mock session source
//!
//! Deterministic race recordings for tests and demos that do not have a
//! recorder dump at hand, plus a live feed that replays a recording in
//! batches the way an in-progress session arrives.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use contracts::{
    Compound, EntityId, EntityRecord, RaceDataset, Sample, TrackStatusEvent, WeatherEvent,
};
use tokio::sync::mpsc;
use tracing::{debug, trace};

const TEAMS: [&str; 4] = ["Red Bull Racing", "Ferrari", "McLaren", "Mercedes"];
const STINT_COMPOUNDS: [Compound; 3] = [Compound::Medium, Compound::Hard, Compound::Soft];

/// Mock session configuration
#[derive(Debug, Clone)]
pub struct MockSessionConfig {
    pub race_name: String,

    /// Entity ids, one competitor each
    pub entity_ids: Vec<String>,

    /// Timed laps per entity (lap 0 is not generated)
    pub laps: u32,

    /// Samples per lap
    pub samples_per_lap: u32,

    /// Lap length in metres
    pub lap_length: f64,

    /// Lap time of the first entity (ms); each following entity is 250 ms slower
    pub lap_time_ms: f64,

    /// Laps ending in the pit lane
    pub pit_laps: Vec<u32>,

    /// Restart the recorder clock at the start of the lap after this one
    pub reset_after_lap: Option<u32>,
}

impl Default for MockSessionConfig {
    fn default() -> Self {
        Self {
            race_name: "Mock Grand Prix".to_string(),
            entity_ids: vec!["VER".into(), "LEC".into(), "NOR".into()],
            laps: 5,
            samples_per_lap: 40,
            lap_length: 5000.0,
            lap_time_ms: 90_000.0,
            pit_laps: vec![2],
            reset_after_lap: None,
        }
    }
}

/// Mock session generator
pub struct MockSession {
    config: MockSessionConfig,
}

impl MockSession {
    pub fn new(config: MockSessionConfig) -> Self {
        Self { config }
    }

    /// Recording with the default layout and the given entities
    pub fn with_entities(ids: &[&str]) -> Self {
        Self::new(MockSessionConfig {
            entity_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockSessionConfig {
        &self.config
    }

    /// Generate the full recording
    pub fn generate(&self) -> RaceDataset {
        let entities = self
            .config
            .entity_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| EntityRecord {
                id: EntityId::from(id.as_str()),
                name: format!("Driver {id}"),
                team: TEAMS[idx % TEAMS.len()].to_string(),
                team_color: None,
                samples: self.entity_samples(idx),
            })
            .collect();

        let session_ms = self.config.laps as f64 * self.config.lap_time_ms;
        let weather = (0..)
            .map(|minute| minute as f64 * 60_000.0)
            .take_while(|t| *t <= session_ms)
            .enumerate()
            .map(|(idx, t)| WeatherEvent {
                t,
                air_temp: 24.0 + idx as f64 * 0.1,
                track_temp: 38.0 + idx as f64 * 0.2,
                humidity: 45.0,
                rainfall: false,
                wind_speed: 2.5,
                wind_direction: 180,
            })
            .collect();

        let track_status = vec![
            TrackStatusEvent {
                t: 0.0,
                status: "1".into(),
                message: "AllClear".into(),
            },
            TrackStatusEvent {
                t: session_ms / 2.0,
                status: "2".into(),
                message: "Yellow".into(),
            },
            TrackStatusEvent {
                t: session_ms / 2.0 + 20_000.0,
                status: "1".into(),
                message: "AllClear".into(),
            },
        ];

        RaceDataset {
            race_name: self.config.race_name.clone(),
            year: 2024,
            circuit: "Mock Circuit".into(),
            weather,
            track_status,
            entities,
        }
    }

    fn entity_samples(&self, entity_idx: usize) -> Vec<Sample> {
        let cfg = &self.config;
        let n = cfg.samples_per_lap.max(1);
        let lap_time = cfg.lap_time_ms + entity_idx as f64 * 250.0;
        let step_t = lap_time / n as f64;
        let step_d = cfg.lap_length / n as f64;
        let radius = cfg.lap_length / TAU;
        let speed_kph = cfg.lap_length / (lap_time / 1000.0) * 3.6;

        // recorder restarts its clock at the first sample after the reset lap
        let reset_base = cfg.reset_after_lap.map(|lap| lap as f64 * lap_time);

        let mut samples = Vec::with_capacity((cfg.laps * n) as usize);
        let mut stint = 0usize;
        let mut tyre_age = 0u32;

        for lap in 1..=cfg.laps {
            let pit_lap = cfg.pit_laps.contains(&lap);

            for k in 0..n {
                let within = k as f64 * step_d;
                let angle = TAU * within / cfg.lap_length;
                let mut t = (lap - 1) as f64 * lap_time + k as f64 * step_t;
                if let Some(base) = reset_base.filter(|base| t >= *base) {
                    t -= base;
                }

                let in_pit_lane = pit_lap && k >= n - n.div_ceil(10);

                samples.push(Sample {
                    t,
                    lap,
                    dist: (lap - 1) as f64 * cfg.lap_length + within,
                    speed: if in_pit_lane { 80.0 } else { speed_kph },
                    rpm: 11_000.0,
                    gear: if in_pit_lane { 3 } else { 7 },
                    throttle: if in_pit_lane { 20.0 } else { 100.0 },
                    brake: 0.0,
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                    compound: STINT_COMPOUNDS[stint % STINT_COMPOUNDS.len()],
                    tyre_age,
                    is_pit: in_pit_lane,
                    drs: 0,
                    ax: None,
                    ay: None,
                });
            }

            tyre_age += 1;
            if pit_lap {
                stint += 1;
                tyre_age = 0;
            }
        }

        samples
    }
}

/// One batch of freshly recorded samples
#[derive(Debug, Clone)]
pub struct SampleBatch {
    pub entity: EntityId,
    pub samples: Vec<Sample>,
}

/// Replays a recording as a live session in fixed-size batches
pub struct MockLiveFeed {
    dataset: RaceDataset,
    batch_size: usize,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl MockLiveFeed {
    pub fn new(dataset: RaceDataset, batch_size: usize, interval: Duration) -> Self {
        Self {
            dataset,
            batch_size: batch_size.max(1),
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the feed, returning the batch receiver
    ///
    /// Batches are interleaved across entities in recording order; the
    /// channel closes once every sample has been sent.
    pub fn start(&self, channel_capacity: usize) -> mpsc::Receiver<SampleBatch> {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let batches = self.batches();
        let interval = self.interval;
        let running = self.running.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            debug!(batches = batches.len(), "mock live feed started");

            for batch in batches {
                if !running.load(Ordering::Relaxed) {
                    break;
                }

                let entity = batch.entity.clone();
                let len = batch.samples.len();
                if tx.send(batch).await.is_err() {
                    debug!("mock live feed channel closed");
                    break;
                }
                trace!(%entity, samples = len, "mock batch sent");

                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }

            running.store(false, Ordering::SeqCst);
            debug!("mock live feed stopped");
        });

        rx
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn batches(&self) -> Vec<SampleBatch> {
        let mut chunked: Vec<_> = self
            .dataset
            .entities
            .iter()
            .map(|e| (e.id.clone(), e.samples.chunks(self.batch_size)))
            .collect();

        let mut out = Vec::new();
        loop {
            let before = out.len();
            for (id, chunks) in chunked.iter_mut() {
                if let Some(chunk) = chunks.next() {
                    out.push(SampleBatch {
                        entity: id.clone(),
                        samples: chunk.to_vec(),
                    });
                }
            }
            if out.len() == before {
                return out;
            }
        }
    }
}
