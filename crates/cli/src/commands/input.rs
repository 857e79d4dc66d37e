//! Shared input loading for every command.

use std::path::Path;

use config_loader::{ConfigLoader, DatasetLoader};
use contracts::{CircuitProfile, RaceDataset, ReplayConfig};
use ingestion::MockSession;
use tracing::info;

use crate::cli::InputArgs;
use crate::error::{CliError, Result};

/// Everything a command needs to build a session
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// Human-readable origin of the dataset
    pub source: String,
    pub raw: RaceDataset,
    pub config: ReplayConfig,
    /// Explicit circuit profile file, if given
    pub circuit: Option<CircuitProfile>,
}

impl LoadedInput {
    /// Profile used for aggregation: circuit file, then config, then default
    pub fn profile(&self) -> CircuitProfile {
        self.circuit
            .unwrap_or_else(|| self.config.circuit_profile())
    }

    /// Whether the default profile applies
    pub fn uses_default_circuit(&self) -> bool {
        self.circuit.is_none() && self.config.circuit.is_none()
    }
}

/// Load dataset, configuration and circuit profile
pub fn load_input(args: &InputArgs) -> Result<LoadedInput> {
    let config = match &args.config {
        Some(path) => {
            ensure_exists("Config", path)?;
            ConfigLoader::load_from_path(path)
                .map_err(|e| CliError::load(format!("config {}", path.display()), e))?
        }
        None => ReplayConfig::default(),
    };

    let circuit = match &args.circuit {
        Some(path) => {
            ensure_exists("Circuit", path)?;
            Some(
                DatasetLoader::load_circuit(path)
                    .map_err(|e| CliError::load(format!("circuit {}", path.display()), e))?,
            )
        }
        None => None,
    };

    let (source, raw) = match (&args.dataset, args.mock) {
        (_, true) => ("mock session".to_string(), MockSession::new(Default::default()).generate()),
        (Some(path), false) => {
            ensure_exists("Dataset", path)?;
            let raw = DatasetLoader::load_from_path(path)
                .map_err(|e| CliError::load(format!("dataset {}", path.display()), e))?;
            (path.display().to_string(), raw)
        }
        (None, false) => return Err(CliError::MissingDataset),
    };

    info!(
        source = %source,
        race = %raw.race_name,
        entities = raw.entities.len(),
        samples = raw.sample_count(),
        "Input loaded"
    );

    Ok(LoadedInput {
        source,
        raw,
        config,
        circuit,
    })
}

fn ensure_exists(kind: &'static str, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::file_not_found(kind, path.display().to_string()))
    }
}
