//! Sample - one telemetry reading
//!
//! The recorder emits snake_case keys and omits channels it did not capture,
//! so every field except `t` falls back to its default when absent. A sample
//! without `t` is a decode error.

use serde::{Deserialize, Serialize};

/// Tyre compound fitted when the sample was taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    /// Anything the recorder could not classify (`"nan"`, `"TEST_UNKNOWN"`, ...)
    #[default]
    #[serde(other)]
    Unknown,
}

impl Compound {
    /// Canonical upper-case name, as written in recordings
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soft => "SOFT",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
            Self::Intermediate => "INTERMEDIATE",
            Self::Wet => "WET",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Compound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telemetry sample
///
/// `Copy` on purpose: snapshot synthesis runs once per entity per rendered
/// frame and must not allocate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Session time (ms)
    pub t: f64,

    /// Lap number (1-based, 0 = untimed)
    #[serde(default)]
    pub lap: u32,

    /// Distance travelled (m); cumulative over the session or per lap
    #[serde(default)]
    pub dist: f64,

    /// Speed (km/h)
    #[serde(default)]
    pub speed: f64,

    /// Engine speed (rpm)
    #[serde(default)]
    pub rpm: f64,

    /// Selected gear (0 = neutral)
    #[serde(default)]
    pub gear: u8,

    /// Throttle application (%)
    #[serde(default)]
    pub throttle: f64,

    /// Brake application (%)
    #[serde(default)]
    pub brake: f64,

    /// Normalized track position
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,

    /// Tyre compound
    #[serde(default)]
    pub compound: Compound,

    /// Tyre age (laps)
    #[serde(default, alias = "tyreAge")]
    pub tyre_age: u32,

    /// Car is in the pit lane
    #[serde(default, alias = "isPit")]
    pub is_pit: bool,

    /// DRS state code
    #[serde(default)]
    pub drs: u8,

    /// Longitudinal acceleration (g)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ax: Option<f64>,

    /// Lateral acceleration (g)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ay: Option<f64>,
}

impl Sample {
    /// Minimal sample used by tests and generators
    pub fn at(t: f64, lap: u32, dist: f64) -> Self {
        Self {
            t,
            lap,
            dist,
            ..Default::default()
        }
    }
}
