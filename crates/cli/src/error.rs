//! Error types for CLI operations.

use contracts::ReplayError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Input file not found
    #[error("{kind} file not found: {path}")]
    FileNotFound { kind: &'static str, path: String },

    /// Neither a dataset nor --mock was given
    #[error("no dataset given (use --dataset or --mock)")]
    MissingDataset,

    /// Dataset or configuration failed to load
    #[error("Failed to load {what}: {source}")]
    Load {
        what: String,
        #[source]
        source: ReplayError,
    },

    /// Entity not present in the session
    #[error("Unknown entity '{id}' (available: {available})")]
    UnknownEntity { id: String, available: String },

    /// Playback loop error
    #[error("Playback failed: {message}")]
    Playback { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn file_not_found(kind: &'static str, path: impl Into<String>) -> Self {
        Self::FileNotFound {
            kind,
            path: path.into(),
        }
    }

    pub fn load(what: impl Into<String>, source: ReplayError) -> Self {
        Self::Load {
            what: what.into(),
            source,
        }
    }

    pub fn unknown_entity(id: impl Into<String>, available: &[String]) -> Self {
        Self::UnknownEntity {
            id: id.into(),
            available: available.join(", "),
        }
    }

    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CliError::file_not_found("Dataset", "race.json");
        assert_eq!(err.to_string(), "Dataset file not found: race.json");

        let err = CliError::unknown_entity("HAM", &["VER".to_string(), "LEC".to_string()]);
        assert_eq!(err.to_string(), "Unknown entity 'HAM' (available: VER, LEC)");

        let err = CliError::load("dataset", ReplayError::EmptyDataset);
        assert!(err.to_string().contains("contains no entities"));
    }
}
