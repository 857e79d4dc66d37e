//! # Replay Engine
//!
//! Turns raw race recordings into an enriched, queryable model.
//!
//! Responsibilities:
//! - One-shot lap / sector / pit / stint aggregation over repaired samples
//! - O(log n) snapshot interpolation at arbitrary playback times
//! - Latest-at-or-before lookup for sparse weather and track-status streams
//!
//! ## Usage Example
//!
//! ```ignore
//! use replay_engine::{query, ReplayEngine};
//!
//! let engine = ReplayEngine::from_config(&config);
//! let enriched = engine.build(&raw)?;
//!
//! let ver = enriched.entity("VER").unwrap();
//! let snapshot = query(&ver.samples, 125_000.0);
//! ```

mod aggregator;
mod engine;
mod interpolate;
mod sparse;

// Re-exports
pub use aggregator::aggregate;
pub use engine::ReplayEngine;
pub use interpolate::query;
pub use sparse::latest_at_or_before;

// Re-export contracts types
pub use contracts::{EnrichedDataset, EnrichedEntity, Sample, SessionAggregate};
