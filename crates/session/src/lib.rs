//! # Session
//!
//! Caller-side session model for replaying an enriched race.
//!
//! Responsibilities:
//! - Run ingestion + aggregation as a one-shot background task per load
//! - Tag loads with generation ids and drop superseded results
//! - Keep serving the previous session when a load fails
//! - Live append: re-aggregate before new samples become queryable
//! - Map wall-clock frame deltas onto session time
//!
//! ## Usage Example
//!
//! ```ignore
//! use session::{PlaybackClock, SessionStore};
//!
//! let mut store = SessionStore::new(ReplayEngine::from_config(&config));
//! store.submit(raw, None);
//! let session = store.wait_for_latest().await?;
//!
//! let mut clock = PlaybackClock::from_config(session.duration_ms(), &config.playback);
//! clock.play();
//!
//! // every frame
//! store.poll();
//! let position = clock.tick(delta);
//! let snapshots = session.snapshot_all(position);
//! ```

mod clock;
mod loader;
mod session;
mod store;

// Re-exports
pub use clock::{ClockState, PlaybackClock};
pub use loader::{LoadOutcome, SessionLoader};
pub use session::{EntitySnapshot, ReplaySession, Standing};
pub use store::{PollEvent, SessionStore};
