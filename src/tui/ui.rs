//! TUI UI rendering

use super::app::{App, FilterField, ViewMode};
use crate::data_source::MachineState;
use crate::timeline::{
    CursorId, Density, RangePhase, TimelineSample, ViewportMapper, build_series, format_duration,
    format_instant,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Wrap,
        canvas::{Canvas, Line as CanvasLine},
    },
};

const RUNNING_COLOR: Color = Color::Green;
const STOPPED_COLOR: Color = Color::Red;
const PRIMARY_COLOR: Color = Color::White;
const SECONDARY_COLOR: Color = Color::LightRed;

/// Draw the UI based on current app state
pub fn draw(f: &mut Frame, app: &mut App) {
    match app.view_mode {
        ViewMode::Timeline => draw_timeline(f, app),
        ViewMode::Help => draw_help(f),
    }
}

fn draw_timeline(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Chart
            Constraint::Length(5), // Cursors
            Constraint::Length(5), // Footer
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    let chart_block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![
            Span::raw(" "),
            Span::styled(MachineState::Running.label(), Style::default().fg(RUNNING_COLOR)),
            Span::raw(" / "),
            Span::styled(MachineState::Stopped.label(), Style::default().fg(STOPPED_COLOR)),
            Span::raw(" "),
        ]));
    // Measured every frame; the mapper is derived from it on demand
    app.set_plot_area(chart_block.inner(chunks[1]));
    draw_chart(f, app, chart_block, chunks[1]);

    draw_cursors(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    if app.filter.is_some() {
        draw_filter(f, app);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let window = app.view_window();
    let phase = app.range.phase();
    let phase_style = match phase {
        RangePhase::Idle => Style::default().fg(Color::Green),
        RangePhase::Zoomed => Style::default().fg(Color::Magenta),
        RangePhase::InitialLoad | RangePhase::Fetching => Style::default().fg(Color::Yellow),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Machine Timeline - {}", app.machine),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " | {} -> {} | ",
            format_instant(window.start),
            format_instant(window.end)
        )),
        Span::styled(phase.name(), phase_style),
        Span::raw(format!(" | {} events | {}", app.store.len(), app.source_name)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_chart(f: &mut Frame, app: &App, block: Block, area: Rect) {
    if app.range.phase() == RangePhase::InitialLoad {
        let loading = Paragraph::new("Loading events...")
            .style(Style::default().fg(Color::Yellow))
            .block(block);
        f.render_widget(loading, area);
        return;
    }

    if let Density::Excessive { events, pixels } = app.density() {
        let advisory = Paragraph::new(vec![
            Line::from(Span::styled(
                "Too many events to display",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "{} events over {} columns. Narrow the range with [f] or zoom in with [z].",
                events, pixels as u64
            )),
        ])
        .wrap(Wrap { trim: true })
        .block(block.border_style(Style::default().fg(Color::Yellow)));
        f.render_widget(advisory, area);
        return;
    }

    let Some(mapper) = app.mapper() else {
        f.render_widget(block, area);
        return;
    };

    let series = build_series(app.store.events(), &app.view_window());
    let primary = mapper.time_to_pixel(app.cursors.position(CursorId::Primary).timestamp);
    let secondary = mapper.time_to_pixel(app.cursors.position(CursorId::Secondary).timestamp);
    let (x_min, x_max) = mapper.pixel_range();

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([x_min, x_max])
        .y_bounds([-0.25, 1.25])
        .paint(|ctx| {
            for line in step_lines(&series, &mapper) {
                ctx.draw(&line);
            }
            ctx.draw(&CanvasLine::new(primary, -0.25, primary, 1.25, PRIMARY_COLOR));
            ctx.draw(&CanvasLine::new(secondary, -0.25, secondary, 1.25, SECONDARY_COLOR));
        });
    f.render_widget(canvas, area);
}

/// Horizontal hold segments plus a vertical riser at each change
fn step_lines(series: &[TimelineSample], mapper: &ViewportMapper) -> Vec<CanvasLine> {
    let mut lines = Vec::with_capacity(series.len() * 2);
    for pair in series.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let x1 = mapper.time_to_pixel(from.timestamp);
        let x2 = mapper.time_to_pixel(to.timestamp);
        let y = from.level() as f64;
        lines.push(CanvasLine::new(x1, y, x2, y, state_color(from.state)));
        if to.state != from.state {
            lines.push(CanvasLine::new(x2, y, x2, to.level() as f64, state_color(to.state)));
        }
    }
    lines
}

fn state_color(state: MachineState) -> Color {
    match state {
        MachineState::Running => RUNNING_COLOR,
        MachineState::Stopped => STOPPED_COLOR,
    }
}

fn draw_cursors(f: &mut Frame, app: &App, area: Rect) {
    let cursor_line = |id: CursorId, color: Color| {
        let position = app.cursors.position(id);
        let marker = if app.selected == id { "► " } else { "  " };
        Line::from(vec![
            Span::styled(
                format!("{}{:<10}", marker, id.name()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format_instant(position.timestamp)),
            Span::raw("  "),
            Span::styled(position.state.label(), Style::default().fg(state_color(position.state))),
        ])
    };

    let lines = vec![
        cursor_line(CursorId::Primary, PRIMARY_COLOR),
        cursor_line(CursorId::Secondary, SECONDARY_COLOR),
        Line::from(format!(
            "  Between cursors: {}",
            format_duration(app.cursors.duration_between())
        )),
    ];

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Cursors"));
    f.render_widget(panel, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let summary = app.summary();
    let mut lines = vec![Line::from(format!(
        "Running {} | Stopped {} | Starts {} | Stops {} | Availability {:.1}%",
        format_duration(summary.running),
        format_duration(summary.stopped),
        summary.starts,
        summary.stops,
        summary.availability() * 100.0
    ))];

    if let Some(notice) = app.store.notice() {
        lines.push(Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(message) = &app.message {
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "[z] Zoom in [x] Zoom out [f] Filter [r] Refresh [e] Export [Tab] Cursor [←/→] Move [?] Help [q] Quit",
        Style::default().fg(Color::DarkGray),
    )));

    let footer = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn draw_filter(f: &mut Frame, app: &App) {
    let Some(form) = &app.filter else {
        return;
    };
    let area = centered_rect(60, 9, f.area());

    let field = |label: &str, value: &str, active: bool| {
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("  {:<6} ", label)),
            Span::styled(format!("{:<24}", value), style),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        field("Start", &form.start, form.field == FilterField::Start),
        field("End", &form.end, form.field == FilterField::End),
        Line::from(Span::styled(
            "  YYYY-MM-DD HH:MM[:SS] (UTC); empty end means now",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(message) = &app.message {
        lines.push(Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        "  [Tab] Switch field [Enter] Apply [Esc] Cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Filter range"));
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

/// Rect of `width` percent and `height` rows, centered in `area`
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width) / 2),
            Constraint::Percentage(width),
            Constraint::Percentage((100 - width) / 2),
        ])
        .split(vertical[1])[1]
}

fn draw_help(f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Help content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    // Header
    let header = Paragraph::new("Help")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Cursors",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Mouse drag   - Grab a cursor line and move it; release reads the state"),
        Line::from("  Tab          - Switch the keyboard cursor"),
        Line::from("  ←/→          - Move the keyboard cursor one column"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Range",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  z            - Zoom in to the span between the cursors"),
        Line::from("  x            - Zoom out to the loaded range"),
        Line::from("  f            - Filter by start/end (fetches again)"),
        Line::from("  r            - Refresh the loaded range up to now"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e            - Export loaded events as CSV"),
        Line::from("  h or ?       - This help screen"),
        Line::from("  q            - Quit application"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Colors",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("■", Style::default().fg(RUNNING_COLOR)),
            Span::raw(" MARCHA     - Running"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("■", Style::default().fg(STOPPED_COLOR)),
            Span::raw(" PARO       - Stopped"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("│", Style::default().fg(PRIMARY_COLOR)),
            Span::raw(" Primary cursor"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("│", Style::default().fg(SECONDARY_COLOR)),
            Span::raw(" Secondary cursor"),
        ]),
    ];

    let help_widget = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Keyboard Shortcuts & Legend"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(help_widget, chunks[1]);

    // Footer
    let footer = Paragraph::new("[?/Esc] Back to Timeline | [q] Close help")
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::data_source::RawEvent;
    use crate::timeline::RangeLimits;
    use chrono::{TimeZone, Utc};
    use ratatui::{Terminal, backend::TestBackend};

    fn loaded_app() -> App {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut app = App::new("maquina-1", "mock", RangeLimits::default(), ChartConfig::default(), now);
        let request = app
            .request_filter(
                Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap()),
                now,
            )
            .unwrap();
        app.complete_fetch(
            request.ticket,
            Ok(vec![
                RawEvent::new("1", "PARO", "2025-03-01T10:00:00Z"),
                RawEvent::new("2", "MARCHA", "2025-03-01T10:05:00Z"),
            ]),
            now,
        );
        app
    }

    #[test]
    fn test_step_lines() {
        let app = loaded_app();
        let mapper = ViewportMapper::new(app.view_window(), 0.0, 30.0);
        let series = build_series(app.store.events(), &app.view_window());
        let lines = step_lines(&series, &mapper);

        // Hold at 0, riser at 10:05, hold at 1
        assert_eq!(lines.len(), 3);
        assert!((lines[1].x1 - 5.0).abs() < 1e-9);
        assert_eq!((lines[1].y1, lines[1].y2), (0.0, 1.0));
        assert_eq!(lines[1].color, RUNNING_COLOR);
    }

    #[test]
    fn test_draw_measures_plot_area() {
        let mut app = loaded_app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let area = app.plot_area().unwrap();
        assert_eq!(area.x, 1);
        assert_eq!(area.width, 98);
        assert!(app.mapper().is_some());
    }

    #[test]
    fn test_draw_filter_and_help() {
        let mut app = loaded_app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        app.open_filter();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        app.cancel_filter();
        app.toggle_help();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
    }
}
