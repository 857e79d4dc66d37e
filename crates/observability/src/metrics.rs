//! Replay metrics
//!
//! Load lifecycle and playback frame metrics, exported through the `metrics`
//! facade and optionally aggregated in memory for end-of-run summaries.

use metrics::{counter, gauge, histogram};

/// Timing of one rendered playback frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTiming {
    /// Monotonic frame counter
    pub frame_id: u64,

    /// Playback position after the tick (ms)
    pub playback_ms: f64,

    /// Wall-clock time since the previous frame (ms)
    pub wall_delta_ms: f64,

    /// Time spent answering the frame's snapshot queries (µs)
    pub query_us: f64,

    /// Snapshots produced
    pub entities: usize,
}

/// Record metrics for one playback frame
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_frame_metrics;
///
/// let position = clock.tick(delta);
/// let snapshots = session.snapshot_all(position);
/// record_frame_metrics(&timing);
/// ```
pub fn record_frame_metrics(timing: &FrameTiming) {
    counter!("replay_frames_total").increment(1);
    gauge!("replay_last_frame_id").set(timing.frame_id as f64);
    gauge!("replay_playback_position_ms").set(timing.playback_ms);
    histogram!("replay_frame_interval_ms").record(timing.wall_delta_ms);
    histogram!("replay_frame_query_us").record(timing.query_us);
    gauge!("replay_frame_entities").set(timing.entities as f64);
}

/// Record a session that replaced the current model
pub fn record_session_applied(generation: u64, entities: usize, samples: usize) {
    counter!("replay_sessions_applied_total").increment(1);
    gauge!("replay_session_generation").set(generation as f64);
    gauge!("replay_session_entities").set(entities as f64);
    gauge!("replay_session_samples").set(samples as f64);
}

/// Record the wall time of one background load (submit to completion)
pub fn record_load_latency_ms(latency_ms: f64) {
    histogram!("replay_load_latency_ms").record(latency_ms);
}

/// Record a load result discarded because a newer load was submitted
pub fn record_stale_discarded() {
    counter!("replay_stale_results_total").increment(1);
}

/// Record a failed load
pub fn record_load_failed(reason: &str) {
    counter!(
        "replay_load_failures_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Playback metrics aggregator
///
/// Aggregates frame timings in memory for a summary at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct PlaybackMetricsAggregator {
    /// Frames rendered
    pub total_frames: u64,

    /// Frames that arrived later than 1.5x the nominal interval
    pub late_frames: u64,

    /// Nominal frame interval (ms), 0 when unknown
    pub nominal_interval_ms: f64,

    /// Frame interval statistics
    pub interval_stats: RunningStats,

    /// Query time statistics
    pub query_stats: RunningStats,

    /// Playback span covered (ms)
    pub first_position_ms: Option<f64>,
    pub last_position_ms: f64,
}

impl PlaybackMetricsAggregator {
    pub fn new(nominal_interval_ms: f64) -> Self {
        Self {
            nominal_interval_ms,
            ..Default::default()
        }
    }

    /// Fold in one frame
    pub fn update(&mut self, timing: &FrameTiming) {
        self.total_frames += 1;
        if self.nominal_interval_ms > 0.0 && timing.wall_delta_ms > self.nominal_interval_ms * 1.5
        {
            self.late_frames += 1;
        }
        self.interval_stats.push(timing.wall_delta_ms);
        self.query_stats.push(timing.query_us);
        self.first_position_ms.get_or_insert(timing.playback_ms);
        self.last_position_ms = timing.playback_ms;
    }

    /// Build the summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            late_frames: self.late_frames,
            late_rate: if self.total_frames > 0 {
                self.late_frames as f64 / self.total_frames as f64 * 100.0
            } else {
                0.0
            },
            playback_span_ms: self
                .first_position_ms
                .map_or(0.0, |first| self.last_position_ms - first),
            frame_interval_ms: StatsSummary::from(&self.interval_stats),
            query_us: StatsSummary::from(&self.query_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.nominal_interval_ms);
    }
}

/// Playback summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub late_frames: u64,
    pub late_rate: f64,
    pub playback_span_ms: f64,
    pub frame_interval_ms: StatsSummary,
    pub query_us: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Playback Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(
            f,
            "Late frames: {} ({:.2}%)",
            self.late_frames, self.late_rate
        )?;
        writeln!(f, "Playback span: {:.1} s", self.playback_span_ms / 1000.0)?;
        writeln!(f, "Frame interval (ms): {}", self.frame_interval_ms)?;
        writeln!(f, "Query time (us): {}", self.query_us)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
