//! TUI module - Terminal UI for the interactive timeline

use crate::config::ChartConfig;
use crate::data_source::{EventSource, FetchTicket, RawEvent};
use crate::timeline::RangeLimits;
use crate::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod app;
pub mod ui;

use app::{App, FetchRequest, ViewMode};

/// What the `view`/`watch` commands hand to the UI
pub struct Session {
    pub machine: String,
    pub source: Arc<dyn EventSource>,
    pub limits: RangeLimits,
    pub chart: ChartConfig,
    /// Window given on the command line, validated before the terminal is taken over
    pub filter: Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)>,
    /// Watch mode refresh period
    pub refresh_interval: Option<Duration>,
}

struct FetchReply {
    ticket: FetchTicket,
    result: Result<Vec<RawEvent>>,
}

/// Runs fetches as tokio tasks, one at a time
struct Fetcher {
    source: Arc<dyn EventSource>,
    sender: mpsc::UnboundedSender<FetchReply>,
    task: Option<JoinHandle<()>>,
}

impl Fetcher {
    /// Start a fetch, aborting the previous one if it is still running
    fn spawn(&mut self, request: FetchRequest) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        tracing::debug!("Spawning fetch #{}", request.ticket.generation());
        self.task = Some(tokio::spawn(async move {
            let result = source.fetch_events(request.window).await;
            // Receiver is gone once the UI has exited
            let _ = sender.send(FetchReply {
                ticket: request.ticket,
                result,
            });
        }));
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Run the TUI application
pub fn run(session: Session) -> Result<()> {
    let mut app = App::new(
        session.machine,
        session.source.describe(),
        session.limits,
        session.chart,
        Utc::now(),
    );
    let first = match session.filter {
        Some((start, end)) => app.request_filter(start, end, Utc::now())?,
        None => app.begin_initial_load(),
    };

    let (sender, receiver) = mpsc::unbounded_channel();
    let mut fetcher = Fetcher {
        source: session.source,
        sender,
        task: None,
    };
    fetcher.spawn(first);

    // Setup terminal
    enable_raw_mode().map_err(|e| crate::Error::Tui(e.to_string()))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| crate::Error::Tui(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| crate::Error::Tui(e.to_string()))?;

    let res = run_app(
        &mut terminal,
        app,
        &mut fetcher,
        receiver,
        session.refresh_interval,
    );
    fetcher.shutdown();

    // Restore terminal
    disable_raw_mode().map_err(|e| crate::Error::Tui(e.to_string()))?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .map_err(|e| crate::Error::Tui(e.to_string()))?;
    terminal
        .show_cursor()
        .map_err(|e| crate::Error::Tui(e.to_string()))?;

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    fetcher: &mut Fetcher,
    mut replies: mpsc::UnboundedReceiver<FetchReply>,
    refresh_interval: Option<Duration>,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    loop {
        // Apply finished fetches
        while let Ok(reply) = replies.try_recv() {
            app.complete_fetch(reply.ticket, reply.result, Utc::now());
        }

        // Watch mode
        if let Some(interval) = refresh_interval
            && last_refresh.elapsed() >= interval
        {
            last_refresh = Instant::now();
            if let Some(request) = app.refresh(Utc::now()) {
                fetcher.spawn(request);
            }
        }

        terminal
            .draw(|f| ui::draw(f, &mut app))
            .map_err(|e| crate::Error::Tui(e.to_string()))?;

        if event::poll(Duration::from_millis(100)).map_err(|e| crate::Error::Tui(e.to_string()))? {
            let request = match event::read().map_err(|e| crate::Error::Tui(e.to_string()))? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                    None
                }
                _ => None,
            };
            if let Some(request) = request {
                fetcher.spawn(request);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Keyboard input; returns a fetch to start, if any
fn handle_key(app: &mut App, key: KeyEvent) -> Option<FetchRequest> {
    if let Some(form) = app.filter.as_mut() {
        match key.code {
            KeyCode::Esc => app.cancel_filter(),
            KeyCode::Enter => return app.submit_filter(Utc::now()),
            KeyCode::Tab => form.switch_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.push(c),
            _ => {}
        }
        return None;
    }

    if app.view_mode == ViewMode::Help {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::Char('q')
        ) {
            app.toggle_help();
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('h') | KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('z') => app.zoom_in(),
        KeyCode::Char('x') => app.zoom_out(),
        KeyCode::Char('f') => app.open_filter(),
        KeyCode::Char('r') => {
            let request = app.refresh(Utc::now());
            if request.is_none() {
                app.message = Some("Refresh unavailable while zoomed or loading".to_string());
            }
            return request;
        }
        KeyCode::Char('e') => app.export_and_report(Utc::now()),
        KeyCode::Tab => app.switch_cursor(),
        KeyCode::Left => app.nudge_cursor(-1.0),
        KeyCode::Right => app.nudge_cursor(1.0),
        _ => {}
    }
    None
}

/// Mouse input; only the visible timeline takes clicks
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.view_mode != ViewMode::Timeline || app.filter.is_some() {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.drag(mouse.column),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column),
        _ => {}
    }
}
