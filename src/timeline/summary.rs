//! Run/stop totals over a window

use super::series::build_series;
use super::TimeWindow;
use crate::data_source::{Event, MachineState};
use chrono::Duration;
use serde::Serialize;

/// Aggregate of a window's step series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    #[serde(serialize_with = "as_seconds")]
    pub running: Duration,
    #[serde(serialize_with = "as_seconds")]
    pub stopped: Duration,
    /// STOPPED -> RUNNING changes inside the window
    pub starts: usize,
    /// RUNNING -> STOPPED changes inside the window
    pub stops: usize,
}

fn as_seconds<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}

impl WindowSummary {
    /// Share of the window spent running, in `[0, 1]`
    pub fn availability(&self) -> f64 {
        let total = (self.running + self.stopped).num_milliseconds();
        if total <= 0 {
            return 0.0;
        }
        self.running.num_milliseconds() as f64 / total as f64
    }
}

pub fn summarize(events: &[Event], window: &TimeWindow) -> WindowSummary {
    let series = build_series(events, window);
    let mut summary = WindowSummary {
        running: Duration::zero(),
        stopped: Duration::zero(),
        starts: 0,
        stops: 0,
    };

    for pair in series.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let held = to.timestamp - from.timestamp;
        match from.state {
            MachineState::Running => summary.running += held,
            MachineState::Stopped => summary.stopped += held,
        }
        match (from.state, to.state) {
            (MachineState::Stopped, MachineState::Running) => summary.starts += 1,
            (MachineState::Running, MachineState::Stopped) => summary.stops += 1,
            _ => {}
        }
    }

    summary
}
