//! Layered error definitions
//!
//! Categorized by source: config / dataset / session / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ReplayError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Dataset Errors =====
    /// Dataset could not be decoded
    #[error("dataset parse error: {message}")]
    DatasetParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Dataset has no entities
    #[error("dataset contains no entities")]
    EmptyDataset,

    /// Entity failed structural validation
    #[error("malformed entity '{entity_id}': {message}")]
    MalformedEntity { entity_id: String, message: String },

    /// Two entities share an id
    #[error("duplicate entity id: {entity_id}")]
    DuplicateEntity { entity_id: String },

    // ===== Session Errors =====
    /// Entity not present in the current session
    #[error("unknown entity: {entity_id}")]
    UnknownEntity { entity_id: String },

    /// No session has been loaded yet
    #[error("no session loaded")]
    NoSession,

    /// Background aggregation task failed
    #[error("aggregation task failed for generation {generation}: {message}")]
    AggregationFailed { generation: u64, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReplayError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create dataset parse error
    pub fn dataset_parse(message: impl Into<String>) -> Self {
        Self::DatasetParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create malformed entity error
    pub fn malformed_entity(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedEntity {
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }

    /// Create unknown entity error
    pub fn unknown_entity(entity_id: impl Into<String>) -> Self {
        Self::UnknownEntity {
            entity_id: entity_id.into(),
        }
    }

    /// Short stable label, used as a metrics dimension
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::DatasetParse { .. } => "dataset_parse",
            Self::EmptyDataset => "empty_dataset",
            Self::MalformedEntity { .. } => "malformed_entity",
            Self::DuplicateEntity { .. } => "duplicate_entity",
            Self::UnknownEntity { .. } => "unknown_entity",
            Self::NoSession => "no_session",
            Self::AggregationFailed { .. } => "aggregation_failed",
            Self::Io(_) => "io",
        }
    }

    /// Whether the error was caused by the dataset rather than the environment
    pub fn is_dataset_error(&self) -> bool {
        matches!(
            self,
            Self::DatasetParse { .. }
                | Self::EmptyDataset
                | Self::MalformedEntity { .. }
                | Self::DuplicateEntity { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ReplayError>;
