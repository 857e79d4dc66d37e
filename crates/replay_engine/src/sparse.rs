//! Sparse event lookup (weather, track status)

use contracts::Timestamped;

/// The event with the greatest timestamp `<= time`
///
/// `events` must be sorted by timestamp. Ties resolve to the last event
/// sharing the timestamp. Returns `None` when every event is later than
/// `time` (or `time` is `NaN`).
pub fn latest_at_or_before<E: Timestamped>(events: &[E], time: f64) -> Option<&E> {
    let idx = events.partition_point(|e| e.timestamp() <= time);
    idx.checked_sub(1).and_then(|i| events.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{TrackStatusEvent, WeatherEvent};

    fn status(t: f64, status: &str) -> TrackStatusEvent {
        TrackStatusEvent {
            t,
            status: status.into(),
            message: String::new(),
        }
    }

    #[test]
    fn test_lookup() {
        let events = vec![status(0.0, "1"), status(5000.0, "4"), status(9000.0, "1")];

        assert_eq!(latest_at_or_before(&events, -1.0), None);
        assert_eq!(latest_at_or_before(&events, 0.0).unwrap().status, "1");
        assert_eq!(latest_at_or_before(&events, 7000.0).unwrap().status, "4");
        assert_eq!(latest_at_or_before(&events, 1e9).unwrap().t, 9000.0);
        // backward seek
        assert_eq!(latest_at_or_before(&events, 4999.0).unwrap().t, 0.0);
    }

    #[test]
    fn test_ties_and_empty() {
        let events = vec![status(100.0, "1"), status(100.0, "2")];
        assert_eq!(latest_at_or_before(&events, 100.0).unwrap().status, "2");

        let none: Vec<WeatherEvent> = vec![];
        assert!(latest_at_or_before(&none, 100.0).is_none());
        assert!(latest_at_or_before(&events, f64::NAN).is_none());
    }
}
