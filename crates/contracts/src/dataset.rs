//! RaceDataset - loader collaborator output
//!
//! The raw, unrepaired recording of one session: per-entity telemetry plus
//! the sparse weather and track-status streams.

use serde::{Deserialize, Serialize};

use crate::{EntityId, Sample};

/// A value keyed by session time, queried with "latest at or before"
pub trait Timestamped {
    /// Session time (ms)
    fn timestamp(&self) -> f64;
}

impl Timestamped for Sample {
    #[inline]
    fn timestamp(&self) -> f64 {
        self.t
    }
}

/// Raw session recording
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceDataset {
    /// Display name (e.g. "2024 Monaco GP")
    #[serde(default, alias = "raceName")]
    pub race_name: String,

    /// Season
    #[serde(default)]
    pub year: u16,

    /// Circuit name
    #[serde(default)]
    pub circuit: String,

    /// Weather readings (irregular cadence)
    #[serde(default)]
    pub weather: Vec<WeatherEvent>,

    /// Track status changes (flags, safety car)
    #[serde(default, alias = "trackStatus")]
    pub track_status: Vec<TrackStatusEvent>,

    /// Competitors
    #[serde(default, alias = "drivers")]
    pub entities: Vec<EntityRecord>,
}

impl RaceDataset {
    /// Look up a competitor by id
    pub fn entity(&self, id: &str) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Total number of samples across all competitors
    pub fn sample_count(&self) -> usize {
        self.entities.iter().map(|e| e.samples.len()).sum()
    }
}

/// One competitor's raw telemetry stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Short code, unique within the dataset
    #[serde(alias = "driver_abbr")]
    pub id: EntityId,

    /// Full name
    #[serde(default, alias = "driver_name")]
    pub name: String,

    /// Team name
    #[serde(default)]
    pub team: String,

    /// Team colour (`#RRGGBB`)
    #[serde(default, alias = "teamColor", skip_serializing_if = "Option::is_none")]
    pub team_color: Option<String>,

    /// Samples in arrival order
    #[serde(default, alias = "telemetry")]
    pub samples: Vec<Sample>,
}

/// Weather reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherEvent {
    pub t: f64,
    /// Air temperature (°C)
    pub air_temp: f64,
    /// Track surface temperature (°C)
    pub track_temp: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    pub rainfall: bool,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    /// Wind direction (degrees)
    pub wind_direction: u16,
}

impl Timestamped for WeatherEvent {
    #[inline]
    fn timestamp(&self) -> f64 {
        self.t
    }
}

/// Track status change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackStatusEvent {
    pub t: f64,
    /// Status code as published by race control ("1" = green, "4" = SC, ...)
    pub status: String,
    pub message: String,
}

impl Timestamped for TrackStatusEvent {
    #[inline]
    fn timestamp(&self) -> f64 {
        self.t
    }
}
