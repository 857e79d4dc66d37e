//! Playback frame loop.

mod runner;
mod stats;

pub use runner::{PlaybackRunner, RunnerConfig};
pub use stats::PlaybackStats;
