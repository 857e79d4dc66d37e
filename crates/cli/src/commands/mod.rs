//! Command implementations.

mod input;
mod inspect;
mod replay;
mod snapshot;
mod validate;

pub use input::{load_input, LoadedInput};
pub use inspect::run_inspect;
pub use replay::run_replay;
pub use snapshot::run_snapshot;
pub use validate::run_validate;

/// Format a duration in ms as `m:ss.mmm`; unset (infinite) values as `-`
pub(crate) fn format_lap_time(ms: f64) -> String {
    if !ms.is_finite() || ms < 0.0 {
        return "-".to_string();
    }
    let total_ms = ms.round() as u64;
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{minutes}:{seconds:02}.{millis:03}")
}
