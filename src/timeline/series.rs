//! Step-series construction for the chart
//!
//! The series is right-continuous: each sample's state holds until the next
//! sample. It always spans the full window so the chart has both edges.

use super::resolver::{events_before, events_up_to, state_at};
use super::TimeWindow;
use crate::data_source::{Event, MachineState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point of the step series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSample {
    pub timestamp: DateTime<Utc>,
    pub state: MachineState,
}

impl TimelineSample {
    pub fn new(timestamp: DateTime<Utc>, state: MachineState) -> Self {
        Self { timestamp, state }
    }

    /// Plot value (0 = stopped, 1 = running)
    pub fn level(&self) -> u8 {
        self.state.level()
    }
}

/// Events inside the closed window, as listed in exports
pub fn events_within<'a>(events: &'a [Event], window: &TimeWindow) -> &'a [Event] {
    if !window.is_valid() {
        return &[];
    }
    let from = events_before(events, window.start);
    let to = events_up_to(events, window.end);
    &events[from..to.max(from)]
}

/// Events strictly after `window.start` and at or before `window.end`
pub fn transitions_in<'a>(events: &'a [Event], window: &TimeWindow) -> &'a [Event] {
    if !window.is_valid() {
        return &[];
    }
    let from = events_up_to(events, window.start);
    let to = events_up_to(events, window.end);
    &events[from..to.max(from)]
}

/// Build the minimal step series for `window`.
///
/// Empty when the window is inverted. Otherwise: the boundary state at
/// `start`, every transition in `(start, end]`, and the boundary state at `end`.
pub fn build_series(events: &[Event], window: &TimeWindow) -> Vec<TimelineSample> {
    if !window.is_valid() {
        return Vec::new();
    }

    let inside = transitions_in(events, window);
    let mut samples = Vec::with_capacity(inside.len() + 2);

    samples.push(TimelineSample::new(window.start, state_at(events, window.start)));
    samples.extend(
        inside
            .iter()
            .map(|e| TimelineSample::new(e.timestamp, e.state)),
    );
    samples.push(TimelineSample::new(window.end, state_at(events, window.end)));

    // Already ordered; a stable sort keeps the closing sample last on ties.
    samples.sort_by_key(|s| s.timestamp);
    samples
}

/// Whether a window's transitions can be told apart at a given plot width
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Density {
    Legible,
    /// Too many events per horizontal pixel; the user should narrow the range
    Excessive { events: usize, pixels: f64 },
}

impl Density {
    pub fn is_excessive(&self) -> bool {
        matches!(self, Density::Excessive { .. })
    }
}

/// Compare the number of events inside `window` against the plot capacity.
///
/// Counts with two binary searches, so it is cheap enough to run every frame.
pub fn assess_density(
    events: &[Event],
    window: &TimeWindow,
    plot_width_px: f64,
    max_events_per_px: f64,
) -> Density {
    if !window.is_valid() {
        return Density::Legible;
    }

    let count = events_up_to(events, window.end) - events_before(events, window.start);
    let capacity = plot_width_px.max(0.0) * max_events_per_px;
    if count as f64 > capacity {
        Density::Excessive {
            events: count,
            pixels: plot_width_px,
        }
    } else {
        Density::Legible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::data_source::MachineState::{Running, Stopped};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn sample_events() -> Vec<Event> {
        vec![
            Event::new("1", Stopped, at(10, 0)),
            Event::new("2", Running, at(10, 5)),
            Event::new("3", Stopped, at(10, 20)),
        ]
    }

    #[test]
    fn test_reference_scenario() {
        let series = build_series(&sample_events(), &TimeWindow::new(at(10, 0), at(10, 30)));
        assert_eq!(
            series,
            vec![
                TimelineSample::new(at(10, 0), Stopped),
                TimelineSample::new(at(10, 5), Running),
                TimelineSample::new(at(10, 20), Stopped),
                TimelineSample::new(at(10, 30), Stopped),
            ]
        );
    }

    #[test]
    fn test_empty_events() {
        let window = TimeWindow::new(at(9, 0), at(9, 30));
        let series = build_series(&[], &window);
        assert_eq!(
            series,
            vec![
                TimelineSample::new(at(9, 0), Stopped),
                TimelineSample::new(at(9, 30), Stopped),
            ]
        );
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let window = TimeWindow::new(at(10, 30), at(10, 0));
        assert!(build_series(&sample_events(), &window).is_empty());
        assert!(build_series(&[], &window).is_empty());
        assert!(transitions_in(&sample_events(), &window).is_empty());
        assert!(events_within(&sample_events(), &window).is_empty());
    }

    #[test]
    fn test_events_within_is_closed() {
        let events = sample_events();
        let window = TimeWindow::new(at(10, 5), at(10, 20));
        let ids: Vec<&str> = events_within(&events, &window).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["2", "3"]);
        assert_eq!(transitions_in(&events, &window).len(), 1);
    }

    #[test]
    fn test_window_inside_a_run() {
        let series = build_series(&sample_events(), &TimeWindow::new(at(10, 6), at(10, 10)));
        assert_eq!(
            series,
            vec![
                TimelineSample::new(at(10, 6), Running),
                TimelineSample::new(at(10, 10), Running),
            ]
        );
    }

    #[test]
    fn test_window_before_all_events_uses_first_state() {
        let events = vec![Event::new("1", Running, at(12, 0))];
        let series = build_series(&events, &TimeWindow::new(at(10, 0), at(11, 0)));
        assert!(series.iter().all(|s| s.state == Running));
    }

    #[test]
    fn test_series_bounds() {
        let events = sample_events();
        for (start, end) in [(at(9, 0), at(10, 0)), (at(10, 5), at(10, 20)), (at(10, 7), at(10, 7))] {
            let series = build_series(&events, &TimeWindow::new(start, end));
            assert_eq!(series.first().unwrap().timestamp, start);
            assert_eq!(series.last().unwrap().timestamp, end);
            assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }

    #[test]
    fn test_event_at_start_is_not_duplicated() {
        let series = build_series(&sample_events(), &TimeWindow::new(at(10, 5), at(10, 10)));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], TimelineSample::new(at(10, 5), Running));
    }

    #[test]
    fn test_density() {
        let events: Vec<Event> = (0..60u32)
            .map(|m| Event::new(m.to_string(), if m % 2 == 0 { Running } else { Stopped }, at(10, m)))
            .collect();
        let window = TimeWindow::new(at(10, 0), at(10, 59));

        assert_eq!(assess_density(&events, &window, 100.0, 1.0), Density::Legible);
        assert_eq!(
            assess_density(&events, &window, 40.0, 1.0),
            Density::Excessive {
                events: 60,
                pixels: 40.0
            }
        );

        let narrow = TimeWindow::new(at(10, 0), at(10, 9));
        assert!(!assess_density(&events, &narrow, 40.0, 1.0).is_excessive());
    }
}
