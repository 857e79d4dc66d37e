//! # Ingestion Pipeline
//!
//! Load-boundary processing for raw race recordings.
//!
//! Responsibilities:
//! - Reject malformed datasets before any derived data is built
//! - Repair recorder timestamp resets into one monotone timeline
//! - Order the sparse weather and track-status streams
//! - Provide deterministic mock recordings and a batched live feed
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::RepairConfig;
//! use ingestion::{ingest, MockSession};
//!
//! let raw = MockSession::with_entities(&["VER", "LEC"]).generate();
//! let ingested = ingest(&raw, &RepairConfig::default())?;
//! assert_eq!(ingested.entities.len(), 2);
//! ```

mod mock;
mod pipeline;
mod repair;
mod validate;

// Re-exports
pub use mock::{MockLiveFeed, MockSession, MockSessionConfig, SampleBatch};
pub use pipeline::{IngestedDataset, IngestionStats, RepairedEntity, ingest};
pub use repair::{is_monotonic, repair};
pub use validate::validate_dataset;
