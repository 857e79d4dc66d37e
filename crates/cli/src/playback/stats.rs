//! Playback statistics.

use std::time::Duration;

use observability::PlaybackMetricsAggregator;

use crate::commands::format_lap_time;

/// Statistics from a playback run
#[derive(Debug, Clone, Default)]
pub struct PlaybackStats {
    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Final playback position (ms)
    pub final_position_ms: f64,

    /// Session generations applied (initial load included)
    pub generations_applied: u64,

    /// Superseded load results discarded
    pub stale_discarded: u64,

    /// Failed loads
    pub load_failures: u64,

    /// Live sample batches appended
    pub batches_appended: u64,

    /// Frame timing aggregator
    pub frame_metrics: PlaybackMetricsAggregator,
}

impl PlaybackStats {
    /// Rendered frames per wall-clock second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frame_metrics.total_frames as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Playback Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Wall time: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Final position: {}", format_lap_time(self.final_position_ms));
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   ├─ Generations applied: {}", self.generations_applied);
        println!("   ├─ Stale results discarded: {}", self.stale_discarded);
        println!("   ├─ Load failures: {}", self.load_failures);
        println!("   └─ Live batches appended: {}", self.batches_appended);

        let summary = self.frame_metrics.summary();

        println!("\n📈 Frame Metrics");
        println!("   ├─ Frames: {}", summary.total_frames);
        println!(
            "   ├─ Late frames: {} ({:.2}%)",
            summary.late_frames, summary.late_rate
        );
        println!("   ├─ Frame interval (ms): {}", summary.frame_interval_ms);
        println!("   └─ Query time (us): {}", summary.query_us);

        println!();
    }
}
