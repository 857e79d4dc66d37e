//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: the
//! telemetry data model, the enriched output model, engine configuration and
//! the error taxonomy. Every business crate builds on this one; reverse
//! dependencies are prohibited.
//!
//! ## Time Model
//! - All timestamps are session milliseconds (`f64`) as recorded by the
//!   telemetry source, after timestamp repair where noted
//! - Lap numbers are 1-based; lap `0` marks untimed pre-race running

mod circuit;
mod dataset;
mod enriched;
mod entity_id;
mod error;
mod replay_config;
mod sample;

pub use circuit::*;
pub use dataset::*;
pub use enriched::*;
pub use entity_id::EntityId;
pub use error::*;
pub use replay_config::*;
pub use sample::*;
