//! Normalization of raw endpoint records into sorted `Event`s
//!
//! Nothing in here fails on a bad record: unknown states become `Stopped`,
//! records without a parseable timestamp are dropped, and duplicate ids keep
//! their first occurrence.

use super::{Event, MachineState, RawEvent};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashSet;

/// Naive formats accepted when the endpoint omits the offset (read as UTC)
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Split an endpoint body into raw records.
///
/// A body that is not a JSON array is an error; individual elements that are
/// not objects are skipped.
pub fn parse_events_body(body: &str) -> Result<Vec<RawEvent>> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(items) = value else {
        return Err(Error::parser(format!(
            "expected a JSON array of events, got {}",
            json_kind(&value)
        )));
    };

    let total = items.len();
    let records: Vec<RawEvent> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if records.len() < total {
        tracing::warn!(
            "Skipped {} non-object entries in events response",
            total - records.len()
        );
    }

    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse an instant as RFC 3339, or as a naive date-time in UTC
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Strings go through [`parse_instant`]; integers are epoch milliseconds
fn instant_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_instant(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn state_from_value(value: Option<&Value>) -> MachineState {
    match value {
        Some(Value::String(s)) => MachineState::from_wire(s),
        _ => MachineState::Stopped,
    }
}

fn id_from_value(value: Option<&Value>, position: usize) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("#{}", position),
    }
}

/// Normalize raw records into a time-sorted, id-unique event list.
///
/// Sorting is stable, so events sharing a timestamp keep their received order.
pub fn normalize(raw: Vec<RawEvent>) -> Vec<Event> {
    let received = raw.len();
    let mut seen = HashSet::with_capacity(received);
    let mut dropped_time = 0usize;
    let mut dropped_dup = 0usize;

    let mut events: Vec<Event> = Vec::with_capacity(received);
    for (position, record) in raw.into_iter().enumerate() {
        let Some(timestamp) = record.hora.as_ref().and_then(instant_from_value) else {
            dropped_time += 1;
            continue;
        };

        let id = id_from_value(record.id.as_ref(), position);
        if !seen.insert(id.clone()) {
            dropped_dup += 1;
            continue;
        }

        events.push(Event {
            id,
            state: state_from_value(record.estado.as_ref()),
            timestamp,
        });
    }

    events.sort_by_key(|e| e.timestamp);

    if dropped_time > 0 {
        tracing::warn!("Dropped {} events without a parseable timestamp", dropped_time);
    }
    if dropped_dup > 0 {
        tracing::warn!("Dropped {} events with duplicate ids", dropped_dup);
    }
    tracing::debug!("Normalized {} of {} received events", events.len(), received);

    events
}
