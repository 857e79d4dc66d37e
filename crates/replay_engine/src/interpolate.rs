//! Snapshot interpolation
//!
//! Synthesizes an entity's state at an arbitrary time from its repaired,
//! time-sorted samples. Binary search for the bracketing pair keeps every
//! query O(log n) and allocation-free.

use contracts::Sample;

/// Linear blend of two scalars
#[inline]
fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}

/// Blend an optional channel only when both neighbours recorded it
#[inline]
fn lerp_opt(a: Option<f64>, b: Option<f64>, frac: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, frac)),
        _ => a,
    }
}

/// Synthesize the sample at `time`
///
/// - before the first sample (or `NaN`): the first sample
/// - at or after the last sample: the last sample
/// - exactly on a recorded timestamp: that sample, unchanged
///
/// Continuous channels are interpolated linearly; `lap`, `compound` and
/// `tyre_age` come from the earlier sample; `gear` and `drs` snap to the
/// nearer sample; `is_pit` is set if either neighbour is in the pit lane.
///
/// Returns `None` only when `samples` is empty.
///
/// `samples` must be sorted by `t`. Data repaired with
/// `JitterPolicy::Preserve` may not be, and then an exact-time query can
/// land on an interpolated value rather than the recorded sample.
pub fn query(samples: &[Sample], time: f64) -> Option<Sample> {
    let first = samples.first()?;
    let last = samples.last()?;

    // negated so NaN also lands here
    if !(time > first.t) {
        return Some(*first);
    }
    if time >= last.t {
        return Some(*last);
    }

    let hi_idx = samples.partition_point(|s| s.t <= time);
    let lo = &samples[hi_idx - 1];
    let hi = &samples[hi_idx];

    if lo.t == time {
        return Some(*lo);
    }

    let frac = ((time - lo.t) / (hi.t - lo.t)).clamp(0.0, 1.0);
    let nearest = if frac < 0.5 { lo } else { hi };

    Some(Sample {
        t: time,
        lap: lo.lap,
        dist: lerp(lo.dist, hi.dist, frac),
        speed: lerp(lo.speed, hi.speed, frac),
        rpm: lerp(lo.rpm, hi.rpm, frac),
        gear: nearest.gear,
        throttle: lerp(lo.throttle, hi.throttle, frac),
        brake: lerp(lo.brake, hi.brake, frac),
        x: lerp(lo.x, hi.x, frac),
        y: lerp(lo.y, hi.y, frac),
        compound: lo.compound,
        tyre_age: lo.tyre_age,
        is_pit: lo.is_pit || hi.is_pit,
        drs: nearest.drs,
        ax: lerp_opt(lo.ax, hi.ax, frac),
        ay: lerp_opt(lo.ay, hi.ay, frac),
    })
}
