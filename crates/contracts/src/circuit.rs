//! CircuitProfile - session-selection collaborator input
//!
//! Lap length and the two distance thresholds that split a lap into three
//! sectors. Immutable for the lifetime of a session.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lap length used when no profile is supplied (m)
pub const DEFAULT_LAP_LENGTH: f64 = 5000.0;

/// Fraction of the lap at which sector 1 ends
pub const DEFAULT_S1_FRACTION: f64 = 0.28;

/// Fraction of the lap at which sector 2 ends
pub const DEFAULT_S2_FRACTION: f64 = 0.68;

/// Circuit geometry needed for sector timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CircuitProfile {
    /// Nominal lap length (m)
    #[serde(alias = "lap_length")]
    #[validate(range(exclusive_min = 0.0))]
    pub lap_length: f64,

    /// Sector thresholds, measured from the start line
    #[serde(alias = "sectors", alias = "sector_boundaries")]
    #[validate(nested)]
    pub sector_boundaries: SectorBoundaries,
}

/// Within-lap distances at which sectors 1 and 2 end (m)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SectorBoundaries {
    #[serde(alias = "s1_end")]
    #[validate(range(min = 0.0))]
    pub s1_end: f64,

    #[serde(alias = "s2_end")]
    #[validate(range(min = 0.0))]
    pub s2_end: f64,
}

impl CircuitProfile {
    /// Profile with sector boundaries at the default lap fractions
    pub fn with_lap_length(lap_length: f64) -> Self {
        Self {
            lap_length,
            sector_boundaries: SectorBoundaries {
                s1_end: (lap_length * DEFAULT_S1_FRACTION).trunc(),
                s2_end: (lap_length * DEFAULT_S2_FRACTION).trunc(),
            },
        }
    }

    /// Resolve an optional profile, falling back to the default
    pub fn or_default(profile: Option<CircuitProfile>) -> Self {
        profile.unwrap_or_default()
    }
}

impl Default for CircuitProfile {
    fn default() -> Self {
        Self::with_lap_length(DEFAULT_LAP_LENGTH)
    }
}
