//! EnrichedDataset - Replay Engine output
//!
//! Repaired samples plus everything derived from them in the aggregation
//! pass. Built fresh on every load and never mutated afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    CircuitProfile, Compound, EntityId, Sample, TrackStatusEvent, WeatherEvent,
};

/// Per-lap sector durations (ms); `None` until the sector is timed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorTimes {
    pub s1: Option<f64>,
    pub s2: Option<f64>,
    pub s3: Option<f64>,
}

/// Best sector durations (ms); `+∞` until a sector has been timed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorBests {
    #[serde(with = "finite_or_null")]
    pub s1: f64,
    #[serde(with = "finite_or_null")]
    pub s2: f64,
    #[serde(with = "finite_or_null")]
    pub s3: f64,
}

impl Default for SectorBests {
    fn default() -> Self {
        Self {
            s1: f64::INFINITY,
            s2: f64::INFINITY,
            s3: f64::INFINITY,
        }
    }
}

impl SectorBests {
    /// Fold a lap's sector times into the bests
    pub fn absorb(&mut self, sectors: &SectorTimes) {
        if let Some(s1) = sectors.s1 {
            self.s1 = self.s1.min(s1);
        }
        if let Some(s2) = sectors.s2 {
            self.s2 = self.s2.min(s2);
        }
        if let Some(s3) = sectors.s3 {
            self.s3 = self.s3.min(s3);
        }
    }

    /// Sum of the three bests, if all have been timed
    pub fn theoretical_best(&self) -> Option<f64> {
        let total = self.s1 + self.s2 + self.s3;
        total.is_finite().then_some(total)
    }
}

/// A false -> true transition of the pit flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitStopEvent {
    pub entity: EntityId,
    pub lap: u32,
    pub timestamp: f64,
}

/// Consecutive laps run on one compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stint {
    pub compound: Compound,
    /// 1-based stint number
    pub stint: u32,
    pub start_lap: u32,
    pub lap_count: u32,
}

/// What timestamp repair changed for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    /// Recording-segment resets that received an offset
    pub resets: u32,
    /// Sub-threshold backwards samples raised to their predecessor
    pub clamped_samples: u32,
}

/// One competitor after repair and aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedEntity {
    pub id: EntityId,
    pub name: String,
    pub team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_color: Option<String>,

    /// Repaired samples, non-decreasing in `t`
    pub samples: Arc<[Sample]>,

    /// lap -> duration (ms)
    pub lap_times: BTreeMap<u32, f64>,

    /// lap -> sector durations
    pub sector_times: BTreeMap<u32, SectorTimes>,

    pub personal_bests: SectorBests,

    #[serde(with = "finite_or_null")]
    pub personal_best_lap: f64,

    pub stints: Vec<Stint>,

    /// Lap closed at stream end without a confirming lap transition
    pub provisional_lap: Option<u32>,

    pub repair: RepairReport,
}

impl EnrichedEntity {
    /// Number of timed laps
    pub fn lap_count(&self) -> usize {
        self.lap_times.len()
    }

    /// Laps closed by a real lap transition (excludes the provisional lap)
    pub fn completed_laps(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.lap_times
            .iter()
            .filter(move |(lap, _)| Some(**lap) != self.provisional_lap)
            .map(|(lap, time)| (*lap, *time))
    }
}

/// Session-wide aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAggregate {
    pub max_lap: u32,
    pub max_timestamp: f64,
    pub session_bests: SectorBests,
    #[serde(with = "finite_or_null")]
    pub session_best_lap_time: f64,
    pub pit_stop_events: Vec<PitStopEvent>,
    /// Within-lap distance of the first completed lap (m)
    pub calculated_track_length: f64,
}

impl Default for SessionAggregate {
    fn default() -> Self {
        Self {
            max_lap: 0,
            max_timestamp: 0.0,
            session_bests: SectorBests::default(),
            session_best_lap_time: f64::INFINITY,
            pit_stop_events: Vec::new(),
            calculated_track_length: 0.0,
        }
    }
}

/// Dataset after repair and aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedDataset {
    pub race_name: String,
    pub year: u16,
    pub circuit: String,
    /// Sorted by `t`
    pub weather: Vec<WeatherEvent>,
    /// Sorted by `t`
    pub track_status: Vec<TrackStatusEvent>,
    pub entities: Vec<EnrichedEntity>,
    pub aggregate: SessionAggregate,
    /// Profile the sectors were timed against
    pub circuit_profile: CircuitProfile,
}

impl EnrichedDataset {
    /// Look up a competitor by id
    pub fn entity(&self, id: &str) -> Option<&EnrichedEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// Serialize `+∞` as `null` and read `null` back as `+∞`
pub mod finite_or_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bests_absorb() {
        let mut bests = SectorBests::default();
        assert!(bests.theoretical_best().is_none());

        bests.absorb(&SectorTimes {
            s1: Some(20_000.0),
            s2: None,
            s3: Some(31_000.0),
        });
        bests.absorb(&SectorTimes {
            s1: Some(21_000.0),
            s2: Some(40_000.0),
            s3: Some(30_500.0),
        });

        assert_eq!(bests.s1, 20_000.0);
        assert_eq!(bests.s2, 40_000.0);
        assert_eq!(bests.s3, 30_500.0);
        assert_eq!(bests.theoretical_best(), Some(90_500.0));
    }

    #[test]
    fn test_unset_bests_serialize_as_null() {
        let json = serde_json::to_string(&SectorBests::default()).unwrap();
        assert_eq!(json, r#"{"s1":null,"s2":null,"s3":null}"#);

        let parsed: SectorBests = serde_json::from_str(&json).unwrap();
        assert!(parsed.s1.is_infinite());
    }
}
