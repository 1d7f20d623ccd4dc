//! Data source module - Abstraction for fetching machine state-change events
//!
//! This module provides a trait-based abstraction over where events come
//! from (the HTTP events endpoint or deterministic mock data), plus the
//! `EventStore` that owns the normalized event list.

use crate::timeline::TimeWindow;
use crate::{Config, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub mod cache;
pub mod http;
pub mod mock;
pub mod models;
pub mod normalize;
pub mod store;

// Re-export models
use crate::cli::DataSourceType;
pub use models::{Event, MachineState, RawEvent};
pub use store::{EventStore, FetchNotice, FetchOutcome, FetchTicket};

/// Source of raw state-change events
///
/// Implementations:
/// - `HttpEventSource`: `GET /eventos` on the configured endpoint
/// - `MockEventSource`: synthetic history for offline use
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch raw events, optionally restricted to a window
    async fn fetch_events(&self, window: Option<TimeWindow>) -> Result<Vec<RawEvent>>;

    /// Short human-readable description (shown in logs and the UI header)
    fn describe(&self) -> String;
}

/// Create an event source based on type and configuration
pub fn create_event_source(
    source_type: DataSourceType,
    config: &Config,
    cache_enabled: bool,
) -> Result<Arc<dyn EventSource>> {
    match source_type {
        DataSourceType::Mock => Ok(Arc::new(mock::MockEventSource::new(chrono::Utc::now()))),
        DataSourceType::Http => {
            let mut source =
                http::HttpEventSource::new(config.endpoint_url()?, config.endpoint.timeout())?
                    .with_max_retries(config.endpoint.max_retries)
                    .with_retry_delay(config.endpoint.retry_delay());
            if cache_enabled || config.cache.enabled {
                source = source.with_cache(cache::DataSourceCache::new(
                    std::time::Duration::from_secs(config.cache.ttl_secs),
                    Some(config.cache_directory()),
                ));
            }
            Ok(Arc::new(source))
        }
    }
}
