//! Draggable time cursors
//!
//! Two cursors inspect the timeline: `Primary` (drawn black/white) and
//! `Secondary` (drawn red). Both are always kept inside the controller's
//! window; a window change resets them to its bounds.

use super::resolver::state_at;
use super::viewport::{DEFAULT_GRAB_THRESHOLD_PX, ViewportMapper};
use super::TimeWindow;
use crate::data_source::{Event, MachineState};
use chrono::{DateTime, Duration, Local, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorId {
    Primary,
    Secondary,
}

impl CursorId {
    pub fn name(&self) -> &'static str {
        match self {
            CursorId::Primary => "primary",
            CursorId::Secondary => "secondary",
        }
    }

    pub fn other(&self) -> CursorId {
        match self {
            CursorId::Primary => CursorId::Secondary,
            CursorId::Secondary => CursorId::Primary,
        }
    }
}

/// Where a cursor sits and what it last reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPosition {
    pub timestamp: DateTime<Utc>,
    /// State at `timestamp` as of the last commit
    pub state: MachineState,
    pub label: String,
}

impl CursorPosition {
    fn resolved(timestamp: DateTime<Utc>, events: &[Event]) -> Self {
        let state = state_at(events, timestamp);
        Self {
            timestamp,
            state,
            label: cursor_label(timestamp, state),
        }
    }
}

/// Owner of both cursor positions
#[derive(Debug, Clone)]
pub struct CursorController {
    window: TimeWindow,
    primary: CursorPosition,
    secondary: CursorPosition,
    grab_threshold: f64,
}

impl CursorController {
    /// Cursors placed at the window bounds
    pub fn new(window: TimeWindow, events: &[Event]) -> Self {
        Self {
            window,
            primary: CursorPosition::resolved(window.start, events),
            secondary: CursorPosition::resolved(window.clamp(window.end), events),
            grab_threshold: DEFAULT_GRAB_THRESHOLD_PX,
        }
    }

    /// Set the grab distance used by [`Self::select_cursor`]
    pub fn with_grab_threshold(mut self, threshold: f64) -> Self {
        self.grab_threshold = threshold.max(0.0);
        self
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn grab_threshold(&self) -> f64 {
        self.grab_threshold
    }

    /// Adopt a new window: primary goes to its start, secondary to its end.
    pub fn reset(&mut self, window: TimeWindow, events: &[Event]) {
        self.window = window;
        self.primary = CursorPosition::resolved(window.start, events);
        self.secondary = CursorPosition::resolved(window.clamp(window.end), events);
        tracing::debug!("Cursors reset to {}", window);
    }

    pub fn position(&self, id: CursorId) -> &CursorPosition {
        match id {
            CursorId::Primary => &self.primary,
            CursorId::Secondary => &self.secondary,
        }
    }

    fn position_mut(&mut self, id: CursorId) -> &mut CursorPosition {
        match id {
            CursorId::Primary => &mut self.primary,
            CursorId::Secondary => &mut self.secondary,
        }
    }

    /// Cursor whose pixel lies within the grab threshold of `pixel_x`,
    /// preferring the closer one
    pub fn select_cursor(&self, mapper: &ViewportMapper, pixel_x: f64) -> Option<CursorId> {
        let distance = |id: CursorId| (mapper.time_to_pixel(self.position(id).timestamp) - pixel_x).abs();
        let primary = distance(CursorId::Primary);
        let secondary = distance(CursorId::Secondary);

        let (id, best) = if secondary < primary {
            (CursorId::Secondary, secondary)
        } else {
            (CursorId::Primary, primary)
        };
        (best <= self.grab_threshold).then_some(id)
    }

    /// Move a cursor to the instant under `pixel_x`, clamped to the window
    pub fn drag_to(&mut self, id: CursorId, mapper: &ViewportMapper, pixel_x: f64) -> DateTime<Utc> {
        let instant = mapper.pixel_to_time(pixel_x);
        self.move_to(id, instant)
    }

    /// Move a cursor to an instant, clamped to the window
    pub fn move_to(&mut self, id: CursorId, instant: DateTime<Utc>) -> DateTime<Utc> {
        let clamped = self.window.clamp(instant);
        self.position_mut(id).timestamp = clamped;
        clamped
    }

    /// Resolve and store the state and label at the cursor's instant
    pub fn commit(&mut self, id: CursorId, events: &[Event]) -> &CursorPosition {
        let position = self.position_mut(id);
        let state = state_at(events, position.timestamp);
        position.state = state;
        position.label = cursor_label(position.timestamp, state);
        tracing::debug!("Committed {} cursor at {} ({})", id.name(), position.timestamp, state);
        position
    }

    /// Absolute time between the two cursors
    pub fn duration_between(&self) -> Duration {
        (self.secondary.timestamp - self.primary.timestamp).abs()
    }

    /// Window spanned by the cursors, earliest first
    pub fn span(&self) -> TimeWindow {
        let (a, b) = (self.primary.timestamp, self.secondary.timestamp);
        TimeWindow::new(a.min(b), a.max(b))
    }
}

/// Display label for a cursor readout
pub fn cursor_label(timestamp: DateTime<Utc>, state: MachineState) -> String {
    format!("{} {}", format_instant(timestamp), state)
}

/// Instant in the operator's local time
pub fn format_instant(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%d/%m/%Y %H:%M:%S")
        .to_string()
}

/// Duration as days/hours/minutes/seconds, omitting leading zero units
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().abs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
