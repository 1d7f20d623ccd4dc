//! Output formatting module
//!
//! This module handles formatting a window's events for export.

use crate::{
    Result,
    data_source::Event,
    timeline::{TimeWindow, build_series, events_within, format_duration, format_instant, summarize},
};
use chrono::SecondsFormat;
use serde_json::json;

/// Output events as `state,timestamp` rows
pub fn output_csv(w: &mut impl std::io::Write, events: &[Event]) -> Result<()> {
    writeln!(w, "state,timestamp")?;
    for event in events {
        writeln!(
            w,
            "{},{}",
            event.state.label(),
            event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
    }
    Ok(())
}

/// Output events, step series and summary as JSON.
///
/// `events` is the whole loaded history; only rows inside `window` are
/// listed, while the series and summary take the boundary state from it.
pub fn output_json(
    w: &mut impl std::io::Write,
    machine: &str,
    window: &TimeWindow,
    events: &[Event],
) -> Result<()> {
    let summary = summarize(events, window);
    let rows = events_within(events, window);
    let output = json!({
        "machine": machine,
        "window": window,
        "summary": {
            "events": rows.len(),
            "running_secs": summary.running.num_seconds(),
            "stopped_secs": summary.stopped.num_seconds(),
            "starts": summary.starts,
            "stops": summary.stops,
            "availability": summary.availability(),
        },
        "events": rows.iter().map(|e| {
            json!({
                "id": e.id,
                "state": e.state.label(),
                "timestamp": e.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            })
        }).collect::<Vec<_>>(),
        "series": build_series(events, window).iter().map(|s| {
            json!({
                "timestamp": s.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                "level": s.level(),
            })
        }).collect::<Vec<_>>(),
    });

    serde_json::to_writer_pretty(&mut *w, &output)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

/// Output the window's events as text table
pub fn output_table(
    w: &mut impl std::io::Write,
    machine: &str,
    window: &TimeWindow,
    events: &[Event],
) -> Result<()> {
    let summary = summarize(events, window);
    let rows = events_within(events, window);

    writeln!(w, "Machine Timeline - {}", machine)?;
    writeln!(w, "{}", "=".repeat(64))?;
    writeln!(w)?;

    writeln!(w, "Window:")?;
    writeln!(w, "  From: {}", format_instant(window.start))?;
    writeln!(w, "  To:   {}", format_instant(window.end))?;
    writeln!(w)?;

    writeln!(w, "Summary:")?;
    writeln!(w, "  Events:       {}", rows.len())?;
    writeln!(w, "  Running:      {}", format_duration(summary.running))?;
    writeln!(w, "  Stopped:      {}", format_duration(summary.stopped))?;
    writeln!(w, "  Starts/Stops: {}/{}", summary.starts, summary.stops)?;
    writeln!(w, "  Availability: {:.1}%", summary.availability() * 100.0)?;
    writeln!(w)?;

    if !rows.is_empty() {
        writeln!(w, "Events:")?;
        writeln!(w, "{:-<64}", "")?;
        writeln!(w, "{:<20} {:<8} {:<34}", "ID", "State", "Time")?;
        writeln!(w, "{:-<64}", "")?;

        for event in rows {
            let id_short = if event.id.chars().count() > 18 {
                format!("{}...", event.id.chars().take(15).collect::<String>())
            } else {
                event.id.clone()
            };

            writeln!(
                w,
                "{:<20} {:<8} {:<34}",
                id_short,
                event.state.label(),
                format_instant(event.timestamp)
            )?;
        }
        writeln!(w)?;
    }

    Ok(())
}
