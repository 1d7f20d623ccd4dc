//! TUI application state

use crate::cli::output::output_csv;
use crate::config::ChartConfig;
use crate::data_source::{EventStore, FetchOutcome, FetchTicket, RawEvent, normalize::parse_instant};
use crate::timeline::{
    CursorController, CursorId, Density, PlotGeometry, RangeController, RangeLimits, TimeWindow,
    ViewportMapper, WindowSummary, assess_density, summarize,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use std::path::PathBuf;

/// A fetch the event loop should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub window: Option<TimeWindow>,
}

/// View modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Timeline,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterField {
    #[default]
    Start,
    End,
}

/// Text of the filter prompt
#[derive(Debug, Clone, Default)]
pub struct FilterForm {
    pub start: String,
    pub end: String,
    pub field: FilterField,
}

impl FilterForm {
    fn prefilled(window: &TimeWindow) -> Self {
        Self {
            start: window.start.format("%Y-%m-%d %H:%M").to_string(),
            end: String::new(),
            field: FilterField::Start,
        }
    }

    fn active_mut(&mut self) -> &mut String {
        match self.field {
            FilterField::Start => &mut self.start,
            FilterField::End => &mut self.end,
        }
    }

    pub fn push(&mut self, c: char) {
        self.active_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.active_mut().pop();
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            FilterField::Start => FilterField::End,
            FilterField::End => FilterField::Start,
        };
    }
}

fn parse_field(text: &str) -> Result<Option<DateTime<Utc>>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    parse_instant(text)
        .map(Some)
        .ok_or_else(|| Error::InvalidInstant(text.to_string()))
}

/// TUI application state
pub struct App {
    pub machine: String,
    pub source_name: String,
    pub store: EventStore,
    pub range: RangeController,
    pub cursors: CursorController,
    /// Cursor moved by the arrow keys
    pub selected: CursorId,
    /// Cursor grabbed by the mouse
    pub dragging: Option<CursorId>,
    pub filter: Option<FilterForm>,
    /// Validation or export message for the footer
    pub message: Option<String>,
    pub view_mode: ViewMode,
    pub should_quit: bool,
    pub export_dir: PathBuf,
    chart: ChartConfig,
    plot_area: Option<Rect>,
}

impl App {
    pub fn new(
        machine: impl Into<String>,
        source_name: impl Into<String>,
        limits: RangeLimits,
        chart: ChartConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let range = RangeController::new(limits);
        let cursors = CursorController::new(range.display_window(now), &[])
            .with_grab_threshold(chart.cursor_grab_threshold);

        Self {
            machine: machine.into(),
            source_name: source_name.into(),
            store: EventStore::new(),
            range,
            cursors,
            selected: CursorId::Primary,
            dragging: None,
            filter: None,
            message: None,
            view_mode: ViewMode::Timeline,
            should_quit: false,
            export_dir: PathBuf::from("."),
            chart,
            plot_area: None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_help(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Timeline => ViewMode::Help,
            ViewMode::Help => ViewMode::Timeline,
        };
    }

    /// Window the chart shows; the cursors are reset whenever it changes
    pub fn view_window(&self) -> TimeWindow {
        *self.cursors.window()
    }

    /// Record where the chart was rendered this frame
    pub fn set_plot_area(&mut self, area: Rect) {
        self.plot_area = (area.width > 0 && area.height > 0).then_some(area);
    }

    pub fn plot_area(&self) -> Option<Rect> {
        self.plot_area
    }

    /// Plot geometry in terminal columns
    pub fn geometry(&self) -> Option<PlotGeometry> {
        self.plot_area
            .map(|area| PlotGeometry::new(area.x as f64, area.width as f64))
    }

    /// Mapper for the current frame, rebuilt from the measured geometry
    pub fn mapper(&self) -> Option<ViewportMapper> {
        self.geometry()
            .map(|g| ViewportMapper::from_geometry(self.view_window(), &g))
    }

    pub fn density(&self) -> Density {
        match self.geometry() {
            Some(g) => assess_density(
                self.store.events(),
                &self.view_window(),
                g.plot_width(),
                self.chart.max_events_per_pixel,
            ),
            None => Density::Legible,
        }
    }

    pub fn summary(&self) -> WindowSummary {
        summarize(self.store.events(), &self.view_window())
    }

    fn fetch_request(&mut self, window: Option<TimeWindow>) -> FetchRequest {
        FetchRequest {
            ticket: self.store.begin_fetch(),
            window,
        }
    }

    /// First fetch, without a window
    pub fn begin_initial_load(&mut self) -> FetchRequest {
        self.fetch_request(None)
    }

    /// Validate a filter and issue its fetch; nothing changes on error
    pub fn request_filter(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<FetchRequest> {
        let window = self.range.request_filter(start, end, now)?;
        Ok(self.fetch_request(Some(window)))
    }

    /// Re-fetch the loaded span up to now, unless zoomed or already fetching
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Option<FetchRequest> {
        let window = self.range.request_refresh(now)?;
        Some(self.fetch_request(Some(window)))
    }

    /// Apply a fetch reply; stale replies are ignored
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<RawEvent>>,
        now: DateTime<Utc>,
    ) -> FetchOutcome {
        let outcome = self.store.complete_fetch(ticket, result);
        if outcome.is_stale() {
            return outcome;
        }

        let window = self.range.finish_fetch(self.store.events(), now);
        self.cursors.reset(window, self.store.events());
        self.dragging = None;
        outcome
    }

    pub fn open_filter(&mut self) {
        self.filter = Some(FilterForm::prefilled(&self.view_window()));
    }

    pub fn cancel_filter(&mut self) {
        self.filter = None;
    }

    /// Apply the filter prompt; on error the prompt stays open with a message
    pub fn submit_filter(&mut self, now: DateTime<Utc>) -> Option<FetchRequest> {
        let form = self.filter.clone()?;
        let bounds =
            parse_field(&form.start).and_then(|start| Ok((start, parse_field(&form.end)?)));

        match bounds.and_then(|(start, end)| self.request_filter(start, end, now)) {
            Ok(request) => {
                self.filter = None;
                self.message = None;
                Some(request)
            }
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }

    pub fn zoom_in(&mut self) {
        match self.range.zoom_in(self.cursors.span()) {
            Some(window) => {
                self.cursors.reset(window, self.store.events());
                self.message = None;
            }
            None => self.message = Some("Nothing to zoom into".to_string()),
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(window) = self.range.zoom_out() {
            self.cursors.reset(window, self.store.events());
            self.message = None;
        }
    }

    pub fn switch_cursor(&mut self) {
        self.selected = self.selected.other();
    }

    /// Move the selected cursor by `columns` and commit it
    pub fn nudge_cursor(&mut self, columns: f64) {
        let Some(mapper) = self.mapper() else {
            return;
        };
        let id = self.selected;
        let pixel = mapper.time_to_pixel(self.cursors.position(id).timestamp);
        self.cursors.drag_to(id, &mapper, pixel + columns);
        self.cursors.commit(id, self.store.events());
    }

    fn in_plot(&self, column: u16, row: u16) -> bool {
        self.plot_area.is_some_and(|area| {
            column >= area.x
                && column < area.x + area.width
                && row >= area.y
                && row < area.y + area.height
        })
    }

    /// Mouse press: grab the cursor under the pointer, if any
    pub fn press(&mut self, column: u16, row: u16) {
        if !self.in_plot(column, row) || self.density().is_excessive() {
            return;
        }
        let Some(mapper) = self.mapper() else {
            return;
        };
        if let Some(id) = self.cursors.select_cursor(&mapper, column as f64) {
            self.selected = id;
            self.dragging = Some(id);
        }
    }

    /// Mouse drag: move the grabbed cursor live
    pub fn drag(&mut self, column: u16) {
        if let (Some(id), Some(mapper)) = (self.dragging, self.mapper()) {
            self.cursors.drag_to(id, &mapper, column as f64);
        }
    }

    /// Mouse release: commit the grabbed cursor
    pub fn release(&mut self, column: u16) {
        if let Some(id) = self.dragging.take() {
            if let Some(mapper) = self.mapper() {
                self.cursors.drag_to(id, &mapper, column as f64);
            }
            self.cursors.commit(id, self.store.events());
        }
    }

    /// Write the loaded events as CSV into `export_dir`
    pub fn export_csv(&mut self, now: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.export_dir.join(export_file_name(&self.machine, now));
        let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
        output_csv(&mut file, self.store.events())?;
        std::io::Write::flush(&mut file)?;
        tracing::info!("Exported {} events to {}", self.store.len(), path.display());
        Ok(path)
    }

    /// Export and report the result in the footer
    pub fn export_and_report(&mut self, now: DateTime<Utc>) {
        self.message = Some(match self.export_csv(now) {
            Ok(path) => format!("Exported {} events to {}", self.store.len(), path.display()),
            Err(e) => format!("Export failed: {}", e),
        });
    }
}

/// `<machine>_<YYYYmmdd_HHMMSS>.csv`, with unsafe characters replaced
pub fn export_file_name(machine: &str, now: DateTime<Utc>) -> String {
    let machine: String = machine
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}.csv", machine, now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::MachineState;
    use crate::timeline::RangePhase;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn raw_events() -> Vec<RawEvent> {
        vec![
            RawEvent::new("1", "PARO", "2025-03-01T10:00:00Z"),
            RawEvent::new("2", "MARCHA", "2025-03-01T10:05:00Z"),
            RawEvent::new("3", "PARO", "2025-03-01T10:20:00Z"),
        ]
    }

    fn create_app() -> App {
        let mut app = App::new(
            "maquina-1",
            "mock",
            RangeLimits::default(),
            ChartConfig::default(),
            now(),
        );
        // 0..=120 columns
        app.set_plot_area(Rect::new(0, 2, 121, 10));
        app
    }

    fn loaded_app() -> App {
        let mut app = create_app();
        let request = app
            .request_filter(Some(at(10, 0)), Some(at(10, 30)), now())
            .unwrap();
        app.complete_fetch(request.ticket, Ok(raw_events()), now());
        app
    }

    #[test]
    fn test_app_creation() {
        let app = create_app();
        assert_eq!(app.range.phase(), RangePhase::InitialLoad);
        assert_eq!(app.view_window(), TimeWindow::ending_at(now(), Duration::hours(1)));
        assert!(app.store.is_empty());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_initial_load_sets_window_and_cursors() {
        let mut app = create_app();
        let request = app.begin_initial_load();
        assert!(request.window.is_none());

        app.complete_fetch(request.ticket, Ok(raw_events()), now());
        assert_eq!(app.range.phase(), RangePhase::Idle);
        assert_eq!(app.view_window(), TimeWindow::new(at(10, 0), now()));
        assert_eq!(app.cursors.position(CursorId::Primary).timestamp, at(10, 0));
        assert_eq!(app.cursors.position(CursorId::Secondary).timestamp, now());
    }

    #[test]
    fn test_stale_reply_is_ignored() {
        let mut app = create_app();
        let first = app.begin_initial_load();
        let second = app
            .request_filter(Some(at(10, 0)), Some(at(10, 30)), now())
            .unwrap();

        assert!(app.complete_fetch(first.ticket, Ok(raw_events()), now()).is_stale());
        assert!(app.store.is_empty());

        app.complete_fetch(second.ticket, Ok(raw_events()), now());
        assert_eq!(app.store.len(), 3);
        assert_eq!(app.view_window(), TimeWindow::new(at(10, 0), at(10, 30)));
    }

    #[test]
    fn test_failed_fetch_leaves_notice() {
        let mut app = create_app();
        let request = app.begin_initial_load();
        app.complete_fetch(request.ticket, Err(Error::data_source("timeout")), now());

        assert!(app.store.is_empty());
        assert!(app.store.notice().is_some());
        assert_eq!(app.range.phase(), RangePhase::Idle);
    }

    #[test]
    fn test_mouse_drag_commits_state() {
        let mut app = loaded_app();
        // 30 minutes over 120 columns: 4 columns per minute
        app.press(0, 5);
        assert_eq!(app.dragging, Some(CursorId::Primary));

        app.drag(40);
        assert_eq!(app.cursors.position(CursorId::Primary).timestamp, at(10, 10));
        // State is only resolved on release
        assert_eq!(app.cursors.position(CursorId::Primary).state, MachineState::Stopped);

        app.release(40);
        assert!(app.dragging.is_none());
        assert_eq!(app.cursors.position(CursorId::Primary).state, MachineState::Running);
    }

    #[test]
    fn test_press_outside_plot_or_far_from_cursor() {
        let mut app = loaded_app();
        app.press(0, 0);
        assert!(app.dragging.is_none());
        app.press(60, 5);
        assert!(app.dragging.is_none());
    }

    #[test]
    fn test_zoom_in_and_out() {
        let mut app = loaded_app();
        app.cursors.move_to(CursorId::Primary, at(10, 5));
        app.cursors.move_to(CursorId::Secondary, at(10, 20));

        app.zoom_in();
        assert_eq!(app.range.phase(), RangePhase::Zoomed);
        assert_eq!(app.view_window(), TimeWindow::new(at(10, 5), at(10, 20)));
        // No fetch while zoomed
        assert!(!app.store.is_fetching());
        assert!(app.refresh(now()).is_none());

        app.zoom_out();
        assert_eq!(app.range.phase(), RangePhase::Idle);
        assert_eq!(app.view_window(), TimeWindow::new(at(10, 0), at(10, 30)));
    }

    #[test]
    fn test_nudge_selected_cursor() {
        let mut app = loaded_app();
        app.switch_cursor();
        assert_eq!(app.selected, CursorId::Secondary);

        app.nudge_cursor(-4.0);
        assert_eq!(app.cursors.position(CursorId::Secondary).timestamp, at(10, 29));
        // Cannot leave the window
        app.nudge_cursor(400.0);
        assert_eq!(app.cursors.position(CursorId::Secondary).timestamp, at(10, 30));
    }

    #[test]
    fn test_filter_prompt() {
        let mut app = loaded_app();
        app.open_filter();
        let form = app.filter.as_mut().unwrap();
        form.start = "2025-03-01 11:00".to_string();
        form.switch_field();
        for c in "2025-03-01 10:00".chars() {
            form.push(c);
        }

        // start after end: rejected, prompt stays open
        assert!(app.submit_filter(now()).is_none());
        assert!(app.filter.is_some());
        assert!(app.message.is_some());
        assert_eq!(app.range.phase(), RangePhase::Idle);

        let form = app.filter.as_mut().unwrap();
        form.end.clear();
        let request = app.submit_filter(now()).unwrap();
        assert_eq!(request.window, Some(TimeWindow::new(at(11, 0), now())));
        assert!(app.filter.is_none());
        assert_eq!(app.range.phase(), RangePhase::Fetching);
    }

    #[test]
    fn test_density_advisory() {
        let mut app = loaded_app();
        assert!(!app.density().is_excessive());

        app.set_plot_area(Rect::new(0, 2, 2, 10));
        assert!(app.density().is_excessive());
    }

    #[test]
    fn test_export_csv() {
        let mut app = loaded_app();
        app.export_dir = std::env::temp_dir();
        let path = app.export_csv(now()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("state,timestamp\n"));
        assert_eq!(text.lines().count(), 4);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("línea 2/a", now()), "l_nea_2_a_20250301_120000.csv");
    }

    #[test]
    fn test_app_quit() {
        let mut app = create_app();
        app.toggle_help();
        assert_eq!(app.view_mode, ViewMode::Help);
        app.quit();
        assert!(app.should_quit);
    }
}
