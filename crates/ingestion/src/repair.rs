//! Timestamp repair
//!
//! Recorders restart their clock when a session is split into several
//! recording segments. A backwards jump larger than the reset threshold marks
//! a new segment; the segment (and everything after it) is shifted so it
//! continues `segment_gap_ms` after the previous sample.

use contracts::{JitterPolicy, RepairConfig, RepairReport, Sample};

/// Repair one entity's samples
///
/// Returns a fresh vector; the input is never modified. Resets are detected
/// on the raw timestamps, so an offset applied to an earlier segment cannot
/// mask a later reset. With [`JitterPolicy::Clamp`] the output is
/// non-decreasing in `t`.
pub fn repair(raw: &[Sample], config: &RepairConfig) -> (Vec<Sample>, RepairReport) {
    let mut repaired = Vec::with_capacity(raw.len());
    let mut report = RepairReport::default();
    let mut offset = 0.0;
    let mut prev_raw: Option<f64> = None;
    let mut prev_repaired = f64::NEG_INFINITY;

    for sample in raw {
        if let Some(prev) = prev_raw {
            if sample.t < prev - config.reset_threshold_ms {
                // new segment starts right after the previous cumulative time
                offset = prev_repaired + config.segment_gap_ms;
                report.resets += 1;
            }
        }
        prev_raw = Some(sample.t);

        let mut t = sample.t + offset;
        if t < prev_repaired && config.jitter_policy == JitterPolicy::Clamp {
            t = prev_repaired;
            report.clamped_samples += 1;
        }
        prev_repaired = t;

        repaired.push(Sample { t, ..*sample });
    }

    (repaired, report)
}

/// True when `samples` is non-decreasing in `t`
pub fn is_monotonic(samples: &[Sample]) -> bool {
    samples.windows(2).all(|w| w[1].t >= w[0].t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn timeline(ts: &[f64]) -> Vec<Sample> {
        ts.iter().map(|&t| Sample::at(t, 1, 0.0)).collect()
    }

    fn times(samples: &[Sample]) -> Vec<f64> {
        samples.iter().map(|s| s.t).collect()
    }

    #[test]
    fn test_clean_stream_untouched() {
        let raw = timeline(&[0.0, 250.0, 500.0, 750.0]);
        let (repaired, report) = repair(&raw, &RepairConfig::default());
        assert_eq!(repaired, raw);
        assert_eq!(report, RepairReport::default());
    }

    #[test]
    fn test_segment_reset_continues_after_gap() {
        let raw = timeline(&[49_000.0, 50_000.0, 200.0, 1_200.0]);
        let (repaired, report) = repair(&raw, &RepairConfig::default());
        assert_eq!(times(&repaired), vec![49_000.0, 50_000.0, 51_200.0, 52_200.0]);
        assert_eq!(report.resets, 1);
    }

    #[test]
    fn test_multiple_resets_accumulate() {
        let raw = timeline(&[0.0, 50_000.0, 200.0, 30_000.0, 100.0, 600.0]);
        let (repaired, report) = repair(&raw, &RepairConfig::default());
        // segment 2 offset = 50_000 + 1_000, segment 3 offset = 81_000 + 1_000
        assert_eq!(
            times(&repaired),
            vec![0.0, 50_000.0, 51_200.0, 81_000.0, 82_100.0, 82_600.0]
        );
        assert_eq!(report.resets, 2);
        assert!(is_monotonic(&repaired));
    }

    #[test]
    fn test_jitter_is_not_a_reset() {
        let raw = timeline(&[1_000.0, 2_000.0, 1_900.0, 3_000.0]);

        let (clamped, report) = repair(&raw, &RepairConfig::default());
        assert_eq!(times(&clamped), vec![1_000.0, 2_000.0, 2_000.0, 3_000.0]);
        assert_eq!(report.resets, 0);
        assert_eq!(report.clamped_samples, 1);

        let preserve = RepairConfig {
            jitter_policy: JitterPolicy::Preserve,
            ..Default::default()
        };
        let (kept, report) = repair(&raw, &preserve);
        assert_eq!(kept, raw);
        assert_eq!(report.clamped_samples, 0);
    }

    #[test]
    fn test_other_fields_preserved() {
        let mut raw = timeline(&[60_000.0, 10.0]);
        raw[1].speed = 287.0;
        raw[1].lap = 4;
        let (repaired, _) = repair(&raw, &RepairConfig::default());
        assert_eq!(repaired[1].speed, 287.0);
        assert_eq!(repaired[1].lap, 4);
        assert_eq!(repaired[1].t, 61_010.0);
    }

    #[test]
    fn test_empty_input() {
        let (repaired, report) = repair(&[], &RepairConfig::default());
        assert!(repaired.is_empty());
        assert_eq!(report.resets, 0);
    }

    #[test]
    fn test_no_large_negative_jump_survives() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = RepairConfig {
            jitter_policy: JitterPolicy::Preserve,
            ..Default::default()
        };

        for _ in 0..50 {
            let mut t = 0.0;
            let raw: Vec<Sample> = (0..200)
                .map(|_| {
                    t = if rng.random_bool(0.03) {
                        rng.random_range(0.0..5_000.0)
                    } else {
                        t + rng.random_range(-400.0..600.0)
                    };
                    Sample::at(t, 1, 0.0)
                })
                .collect();

            let (repaired, _) = repair(&raw, &config);
            for w in repaired.windows(2) {
                assert!(w[1].t >= w[0].t - config.reset_threshold_ms);
            }

            let (clamped, _) = repair(&raw, &RepairConfig::default());
            assert!(is_monotonic(&clamped));
        }
    }
}
