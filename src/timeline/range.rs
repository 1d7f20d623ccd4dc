//! Active query window and zoom state
//!
//! ```text
//! InitialLoad --finish_fetch--> Idle --request_filter--> Fetching --finish_fetch--> Idle
//!                                 |  <-------zoom_out-------  Zoomed
//!                                 +--------zoom_in--------->  (no fetch)
//! ```
//!
//! Filtering always goes through a fetch; zooming only narrows the view over
//! events that are already loaded.

use super::TimeWindow;
use crate::config::RangeConfig;
use crate::data_source::Event;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePhase {
    InitialLoad,
    Idle,
    Fetching,
    Zoomed,
}

impl RangePhase {
    pub fn name(&self) -> &'static str {
        match self {
            RangePhase::InitialLoad => "loading",
            RangePhase::Idle => "idle",
            RangePhase::Fetching => "fetching",
            RangePhase::Zoomed => "zoomed",
        }
    }
}

/// Bounds applied to requested windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLimits {
    /// Oldest instant a filter may reach, relative to now
    pub max_lookback: Duration,
    /// Window used when nothing is known yet
    pub default_span: Duration,
}

impl Default for RangeLimits {
    fn default() -> Self {
        Self {
            max_lookback: Duration::days(90),
            default_span: Duration::hours(1),
        }
    }
}

impl From<&RangeConfig> for RangeLimits {
    fn from(config: &RangeConfig) -> Self {
        Self {
            max_lookback: config.max_lookback(),
            default_span: config.default_window(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// First load without an explicit window; the window is derived from the result
    Initial,
    Window(TimeWindow),
}

/// Owner of the active window
#[derive(Debug, Clone)]
pub struct RangeController {
    phase: RangePhase,
    limits: RangeLimits,
    fetched: Option<TimeWindow>,
    active: Option<TimeWindow>,
    pending: Option<Pending>,
}

impl Default for RangeController {
    fn default() -> Self {
        Self::new(RangeLimits::default())
    }
}

impl RangeController {
    pub fn new(limits: RangeLimits) -> Self {
        Self {
            phase: RangePhase::InitialLoad,
            limits,
            fetched: None,
            active: None,
            pending: Some(Pending::Initial),
        }
    }

    pub fn phase(&self) -> RangePhase {
        self.phase
    }

    pub fn limits(&self) -> &RangeLimits {
        &self.limits
    }

    /// Window currently displayed
    pub fn active_window(&self) -> Option<TimeWindow> {
        self.active
    }

    /// Window covered by the loaded events
    pub fn fetched_window(&self) -> Option<TimeWindow> {
        self.fetched
    }

    pub fn is_zoomed(&self) -> bool {
        self.phase == RangePhase::Zoomed
    }

    /// Displayed window, or the default window when nothing is loaded yet
    pub fn display_window(&self, now: DateTime<Utc>) -> TimeWindow {
        self.active
            .unwrap_or_else(|| TimeWindow::ending_at(now, self.limits.default_span))
    }

    /// Validate a user filter and enter `Fetching`.
    ///
    /// `start` is required; a missing `end` means now. Both bounds are
    /// clamped to `[now - max_lookback, now]`, so a range lying wholly outside
    /// collapses onto the nearest edge. Nothing changes on error.
    pub fn request_filter(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<TimeWindow> {
        let start = start.ok_or_else(|| Error::invalid_range("a start instant is required"))?;
        let end = end.unwrap_or(now);

        if start > end {
            return Err(Error::invalid_range(format!(
                "start {} is after end {}",
                start.format("%Y-%m-%d %H:%M:%S"),
                end.format("%Y-%m-%d %H:%M:%S")
            )));
        }

        let ceiling = self.ceiling(now);
        let window = TimeWindow::new(start.clamp(ceiling, now), end.clamp(ceiling, now));
        tracing::info!("Filter requested: {}", window);
        self.begin_fetch(window);
        Ok(window)
    }

    /// Re-fetch the loaded span, slid to end at `now`.
    ///
    /// Only from `Idle`; a zoomed view or an in-flight fetch is left alone.
    pub fn request_refresh(&mut self, now: DateTime<Utc>) -> Option<TimeWindow> {
        if self.phase != RangePhase::Idle {
            return None;
        }
        let span = self.fetched?.span();
        let start = now.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let window = TimeWindow::new(start.max(self.ceiling(now)), now);
        tracing::debug!("Refresh requested: {}", window);
        self.begin_fetch(window);
        Some(window)
    }

    /// Oldest instant a window may reach
    fn ceiling(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.limits.max_lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn begin_fetch(&mut self, window: TimeWindow) {
        self.pending = Some(Pending::Window(window));
        if self.phase != RangePhase::InitialLoad {
            self.phase = RangePhase::Fetching;
        }
    }

    /// Adopt the result of the latest fetch and return the new active window.
    ///
    /// A failed fetch is finished the same way, with an empty event list.
    pub fn finish_fetch(&mut self, events: &[Event], now: DateTime<Utc>) -> TimeWindow {
        let window = match self.pending.take() {
            Some(Pending::Window(window)) => window,
            Some(Pending::Initial) => self.default_window(events, now),
            None => self.active.unwrap_or_else(|| self.default_window(events, now)),
        };

        self.fetched = Some(window);
        self.active = Some(window);
        self.phase = RangePhase::Idle;
        tracing::debug!("Active window: {}", window);
        window
    }

    /// From the earliest loaded event to now, or the default span when empty
    pub fn default_window(&self, events: &[Event], now: DateTime<Utc>) -> TimeWindow {
        match events.first() {
            Some(first) => TimeWindow::new(first.timestamp.max(self.ceiling(now)).min(now), now),
            None => TimeWindow::ending_at(now, self.limits.default_span),
        }
    }

    /// Narrow the view to `span` (typically the cursor pair) without fetching.
    ///
    /// The span is intersected with the loaded window. Returns `None` when
    /// zooming is not possible (no data yet, fetch in flight, empty span).
    pub fn zoom_in(&mut self, span: TimeWindow) -> Option<TimeWindow> {
        if !matches!(self.phase, RangePhase::Idle | RangePhase::Zoomed) {
            return None;
        }
        let fetched = self.fetched?;
        let window = TimeWindow::new(span.start.max(fetched.start), span.end.min(fetched.end));
        if window.start >= window.end {
            return None;
        }

        self.active = Some(window);
        self.phase = RangePhase::Zoomed;
        tracing::info!("Zoomed in to {}", window);
        Some(window)
    }

    /// Restore the loaded window
    pub fn zoom_out(&mut self) -> Option<TimeWindow> {
        if self.phase != RangePhase::Zoomed {
            return None;
        }
        self.active = self.fetched;
        self.phase = RangePhase::Idle;
        tracing::info!("Zoomed out");
        self.active
    }
}
