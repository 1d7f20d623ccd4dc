//! State resolution at arbitrary instants
//!
//! Events are expected sorted ascending by timestamp (as produced by
//! `data_source::normalize`). Every query is a single binary search.

use crate::data_source::{Event, MachineState};
use chrono::{DateTime, Utc};

/// State assumed when no event is known at all
pub const UNKNOWN_STATE: MachineState = MachineState::Stopped;

/// Number of events with `timestamp <= instant`
pub fn events_up_to(events: &[Event], instant: DateTime<Utc>) -> usize {
    events.partition_point(|e| e.timestamp <= instant)
}

/// Number of events with `timestamp < instant`
pub fn events_before(events: &[Event], instant: DateTime<Utc>) -> usize {
    events.partition_point(|e| e.timestamp < instant)
}

/// State assumed for instants preceding every known event.
///
/// The earliest known state is extended backward: with no left-bound
/// information the machine is taken to already be in that state.
pub fn state_before_first(events: &[Event]) -> MachineState {
    events.first().map(|e| e.state).unwrap_or(UNKNOWN_STATE)
}

/// State in effect at `instant`: that of the rightmost event with
/// `timestamp <= instant`.
pub fn state_at(events: &[Event], instant: DateTime<Utc>) -> MachineState {
    match events_up_to(events, instant) {
        0 => state_before_first(events),
        n => events[n - 1].state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn sample_events() -> Vec<Event> {
        vec![
            Event::new("1", MachineState::Stopped, at(10, 0)),
            Event::new("2", MachineState::Running, at(10, 5)),
            Event::new("3", MachineState::Stopped, at(10, 20)),
        ]
    }

    #[test]
    fn test_empty_is_stopped() {
        assert_eq!(state_at(&[], at(10, 0)), MachineState::Stopped);
    }

    #[test]
    fn test_before_first_extends_first_state() {
        let events = vec![
            Event::new("1", MachineState::Running, at(10, 0)),
            Event::new("2", MachineState::Stopped, at(10, 5)),
        ];
        assert_eq!(state_at(&events, at(9, 0)), MachineState::Running);
        assert_eq!(state_at(&events, at(9, 59)), MachineState::Running);
    }

    #[test]
    fn test_exact_and_between_events() {
        let events = sample_events();
        assert_eq!(state_at(&events, at(10, 0)), MachineState::Stopped);
        assert_eq!(state_at(&events, at(10, 5)), MachineState::Running);
        assert_eq!(state_at(&events, at(10, 19)), MachineState::Running);
        assert_eq!(state_at(&events, at(10, 20)), MachineState::Stopped);
        assert_eq!(state_at(&events, at(23, 0)), MachineState::Stopped);
    }

    #[test]
    fn test_equal_timestamps_take_last() {
        let events = vec![
            Event::new("1", MachineState::Running, at(10, 0)),
            Event::new("2", MachineState::Stopped, at(10, 0)),
        ];
        assert_eq!(state_at(&events, at(10, 0)), MachineState::Stopped);
    }

    #[test]
    fn test_matches_linear_scan() {
        let events: Vec<Event> = (0..40u32)
            .map(|i| {
                let state = if i % 3 == 0 {
                    MachineState::Running
                } else {
                    MachineState::Stopped
                };
                Event::new(i.to_string(), state, at(8 + i / 6, (i % 6) * 10))
            })
            .collect();

        for minute in (0..(16 * 60)).step_by(7) {
            let t = at(0, 0) + chrono::Duration::minutes(minute);
            let expected = events
                .iter()
                .rev()
                .find(|e| e.timestamp <= t)
                .map(|e| e.state)
                .unwrap_or(events[0].state);
            assert_eq!(state_at(&events, t), expected, "at {}", t);
        }
    }

    #[test]
    fn test_counts() {
        let events = sample_events();
        assert_eq!(events_up_to(&events, at(10, 5)), 2);
        assert_eq!(events_before(&events, at(10, 5)), 1);
        assert_eq!(events_up_to(&events, at(9, 0)), 0);
    }
}
