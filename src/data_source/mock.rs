//! Mock data source for testing and development
//!
//! Produces a deterministic run/stop history around an anchor instant, in
//! the same shape (and with the same quirks) as the real endpoint: records
//! arrive newest first, a few carry unknown states, one has no valid time.

use super::normalize::parse_instant;
use super::{EventSource, RawEvent};
use crate::timeline::TimeWindow;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Hours of history generated before the anchor
pub const MOCK_HISTORY_HOURS: i64 = 72;
/// Hours generated after the anchor, so watch mode sees new events
pub const MOCK_FUTURE_HOURS: i64 = 24;

/// Minutes each state is held, cycled through
const HOLD_MINUTES: &[i64] = &[47, 12, 95, 8, 30, 3, 140, 22, 61, 15, 5, 33, 18, 72];

/// Mock data source providing a synthetic machine history
pub struct MockEventSource {
    records: Vec<RawEvent>,
}

impl MockEventSource {
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self {
            records: generate_history(anchor),
        }
    }

    /// Serve a fixed set of records
    pub fn with_records(records: Vec<RawEvent>) -> Self {
        Self { records }
    }
}

fn generate_history(anchor: DateTime<Utc>) -> Vec<RawEvent> {
    let mut records = Vec::new();
    let mut at = anchor - Duration::hours(MOCK_HISTORY_HOURS);
    let end = anchor + Duration::hours(MOCK_FUTURE_HOURS);
    let mut running = false;
    let mut n = 0usize;

    while at <= end {
        let estado = if n % 17 == 16 {
            "AVERIA"
        } else if running {
            "MARCHA"
        } else {
            "PARO"
        };
        records.push(RawEvent::new(
            format!("mock-{}", n),
            estado,
            &at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));

        at += Duration::minutes(HOLD_MINUTES[n % HOLD_MINUTES.len()]);
        running = !running;
        n += 1;
    }

    records.push(RawEvent::new(format!("mock-{}", n), "MARCHA", "--:--"));
    records.reverse();
    records
}

fn record_time(record: &RawEvent) -> Option<DateTime<Utc>> {
    record
        .hora
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(parse_instant)
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(&self, window: Option<TimeWindow>) -> Result<Vec<RawEvent>> {
        let now = Utc::now();
        let records = self
            .records
            .iter()
            .filter(|r| match record_time(r) {
                Some(t) => t <= now && window.is_none_or(|w| w.contains(t)),
                None => true,
            })
            .cloned()
            .collect();
        Ok(records)
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
