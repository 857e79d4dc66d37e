//! Engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{CircuitProfile, SectorBoundaries};

/// Slowest accepted playback multiplier
pub const MIN_PLAYBACK_SPEED: f64 = 0.1;

/// Fastest accepted playback multiplier
pub const MAX_PLAYBACK_SPEED: f64 = 64.0;

/// Replay engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ReplayConfig {
    /// Circuit geometry (default profile when absent)
    #[serde(default)]
    #[validate(nested)]
    pub circuit: Option<CircuitConfig>,

    /// Timestamp repair configuration
    #[serde(default)]
    #[validate(nested)]
    pub repair: RepairConfig,

    /// Playback clock configuration
    #[serde(default)]
    #[validate(nested)]
    pub playback: PlaybackConfig,
}

impl ReplayConfig {
    /// Circuit profile to time sectors against
    pub fn circuit_profile(&self) -> CircuitProfile {
        CircuitProfile::or_default(self.circuit.map(CircuitProfile::from))
    }
}

/// Flat circuit table as written in config files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct CircuitConfig {
    /// Nominal lap length (m)
    #[validate(range(exclusive_min = 0.0))]
    pub lap_length: f64,
    /// Sector 1 end (m from the start line)
    #[validate(range(min = 0.0))]
    pub s1_end: f64,
    /// Sector 2 end (m from the start line)
    #[validate(range(min = 0.0))]
    pub s2_end: f64,
}

impl From<CircuitConfig> for CircuitProfile {
    fn from(config: CircuitConfig) -> Self {
        Self {
            lap_length: config.lap_length,
            sector_boundaries: SectorBoundaries {
                s1_end: config.s1_end,
                s2_end: config.s2_end,
            },
        }
    }
}

/// How sub-threshold backwards timestamps are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterPolicy {
    /// Raise the sample to its predecessor's timestamp
    #[default]
    Clamp,
    /// Keep the recorded timestamp
    ///
    /// Samples may stay out of order, so snapshot queries at recorded times
    /// are no longer guaranteed to return the recorded sample.
    Preserve,
}

/// Timestamp repair configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RepairConfig {
    /// Backwards jump (ms) beyond which a sample starts a new recording segment
    #[validate(range(exclusive_min = 0.0))]
    pub reset_threshold_ms: f64,

    /// Gap (ms) inserted between the end of one segment and the next
    #[validate(range(min = 0.0))]
    pub segment_gap_ms: f64,

    /// Sub-threshold jitter handling
    pub jitter_policy: JitterPolicy,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            reset_threshold_ms: 10_000.0,
            segment_gap_ms: 1_000.0,
            jitter_policy: JitterPolicy::Clamp,
        }
    }
}

/// Playback clock configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Playback multiplier (1.0 = real time)
    #[validate(range(min = 0.1, max = 64.0))]
    pub speed: f64,

    /// Frame loop rate (Hz)
    #[validate(range(exclusive_min = 0.0))]
    pub frame_rate_hz: f64,

    /// Restart from the beginning when the end is reached
    pub loop_playback: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            frame_rate_hz: 30.0,
            loop_playback: false,
        }
    }
}
