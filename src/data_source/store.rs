//! Event store
//!
//! Holds the normalized events for the active query window. Each fetch is
//! tagged with a generation; only the reply to the most recent fetch is
//! applied, so a slow stale response never overwrites fresher data.

use super::normalize::normalize;
use super::{Event, EventSource, RawEvent};
use crate::timeline::TimeWindow;
use crate::{Error, Result};

/// Identifies one fetch issued by an `EventStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Recoverable fetch failure shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchNotice {
    pub message: String,
}

impl From<&Error> for FetchNotice {
    fn from(err: &Error) -> Self {
        Self {
            message: format!("Could not load events: {}", err),
        }
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Events replaced
    Applied { count: usize },
    /// Events cleared; the notice explains why
    Failed(FetchNotice),
    /// A newer fetch was issued meanwhile; nothing changed
    Stale,
}

impl FetchOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale)
    }
}

#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
    generation: u64,
    in_flight: bool,
    notice: Option<FetchNotice>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted, id-unique events from the latest applied fetch
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Failure notice from the latest fetch, if it failed
    pub fn notice(&self) -> Option<&FetchNotice> {
        self.notice.as_ref()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Start a fetch; any ticket issued earlier becomes stale
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.in_flight = true;
        FetchTicket(self.generation)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Apply a fetch result if `ticket` is still the latest.
    ///
    /// Errors never propagate: they empty the store and leave a notice.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<RawEvent>>,
    ) -> FetchOutcome {
        if !self.is_current(ticket) {
            tracing::warn!(
                "Ignoring stale fetch #{} (latest is #{})",
                ticket.0,
                self.generation
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = false;

        match result {
            Ok(raw) => {
                self.events = normalize(raw);
                self.notice = None;
                tracing::info!("Loaded {} events (fetch #{})", self.events.len(), ticket.0);
                FetchOutcome::Applied {
                    count: self.events.len(),
                }
            }
            Err(err) => {
                tracing::warn!("Fetch #{} failed: {}", ticket.0, err);
                self.events.clear();
                let notice = FetchNotice::from(&err);
                self.notice = Some(notice.clone());
                FetchOutcome::Failed(notice)
            }
        }
    }

    /// Fetch from `source` and apply the result
    pub async fn fetch(
        &mut self,
        source: &dyn EventSource,
        window: Option<TimeWindow>,
    ) -> FetchOutcome {
        let ticket = self.begin_fetch();
        tracing::debug!("Fetch #{} from {} ({:?})", ticket.0, source.describe(), window);
        let result = source.fetch_events(window).await;
        self.complete_fetch(ticket, result)
    }
}
