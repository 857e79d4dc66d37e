//! # Config Loader
//!
//! File boundary of the replay engine.
//!
//! Responsibilities:
//! - Parse the engine configuration from TOML/JSON and validate it
//! - Decode recorded datasets (JSON) into `RaceDataset`
//! - Decode standalone circuit profiles (JSON/TOML)
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{ConfigLoader, DatasetLoader};
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("replay.toml")).unwrap();
//! let dataset = DatasetLoader::load_from_path(Path::new("2024_Monaco.json")).unwrap();
//! println!("{}: {} entities", dataset.race_name, dataset.entities.len());
//! ```

mod parser;
mod validator;

pub use contracts::{CircuitProfile, RaceDataset, ReplayConfig};
pub use parser::ConfigFormat;

use contracts::ReplayError;
use std::path::Path;
use tracing::{debug, info};

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ReplayConfig, ReplayError> {
        let format = detect_format(path)?;
        let content = read_file(path)?;
        let config = Self::load_from_str(&content, format)?;
        info!(path = %path.display(), "Replay configuration loaded");
        Ok(config)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<ReplayConfig, ReplayError> {
        let config: ReplayConfig = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(config: &ReplayConfig) -> Result<String, ReplayError> {
        toml::to_string_pretty(config)
            .map_err(|e| ReplayError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize configuration to JSON string
    pub fn to_json(config: &ReplayConfig) -> Result<String, ReplayError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ReplayError::config_parse(format!("JSON serialize error: {e}")))
    }
}

/// Dataset and circuit-profile loader
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a recorded session from a JSON file
    ///
    /// Only decoding happens here; structural checks run at ingestion so
    /// that in-memory datasets go through the same gate.
    pub fn load_from_path(path: &Path) -> Result<RaceDataset, ReplayError> {
        let content = read_file(path)?;
        let dataset = Self::load_from_str(&content)?;
        info!(
            path = %path.display(),
            race = %dataset.race_name,
            entities = dataset.entities.len(),
            samples = dataset.sample_count(),
            "Dataset decoded"
        );
        Ok(dataset)
    }

    /// Decode a recorded session from a JSON string
    pub fn load_from_str(content: &str) -> Result<RaceDataset, ReplayError> {
        parser::parse_dataset(content)
    }

    /// Load and validate a circuit profile (.json / .toml)
    pub fn load_circuit(path: &Path) -> Result<CircuitProfile, ReplayError> {
        let format = detect_format(path)?;
        let content = read_file(path)?;
        let profile: CircuitProfile = parser::parse(&content, format)?;
        validator::validate_circuit(&profile)?;
        debug!(
            lap_length = profile.lap_length,
            s1_end = profile.sector_boundaries.s1_end,
            s2_end = profile.sector_boundaries.s2_end,
            "Circuit profile loaded"
        );
        Ok(profile)
    }
}

/// Infer file format from extension
fn detect_format(path: &Path) -> Result<ConfigFormat, ReplayError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ReplayError::config_parse("cannot determine file format from extension"))?;

    ConfigFormat::from_extension(ext)
        .ok_or_else(|| ReplayError::config_parse(format!("unsupported config format: .{ext}")))
}

/// Read file content
fn read_file(path: &Path) -> Result<String, ReplayError> {
    Ok(std::fs::read_to_string(path)?)
}
