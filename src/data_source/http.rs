//! HTTP events endpoint implementation
//!
//! `GET {base_url}/eventos[?start=<ISO8601>][&end=<ISO8601>]`, answering a
//! JSON array of `{ id, estado, hora }` records.

use super::cache::DataSourceCache;
use super::normalize::parse_events_body;
use super::{EventSource, RawEvent};
use crate::timeline::TimeWindow;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::SecondsFormat;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Events endpoint client with retry logic
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    cache: Option<Arc<DataSourceCache>>,
}

impl HttpEventSource {
    /// Create a new endpoint client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
            cache: None,
        })
    }

    /// Set maximum retry attempts
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set delay between retries
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set cache
    pub fn with_cache(mut self, cache: DataSourceCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    pub fn events_url(&self) -> String {
        format!("{}/eventos", self.base_url)
    }

    /// Query string parameters for a window
    pub fn query_params(window: Option<&TimeWindow>) -> Vec<(&'static str, String)> {
        match window {
            Some(w) => vec![
                ("start", w.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", w.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ],
            None => Vec::new(),
        }
    }

    async fn fetch_body(&self, window: Option<&TimeWindow>) -> Result<String> {
        let response = self
            .client
            .get(self.events_url())
            .query(&Self::query_params(window))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Endpoint {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        Ok(response.text().await?)
    }

    /// Fetch a body, retrying transport and server errors
    async fn fetch_with_retry(&self, window: Option<&TimeWindow>) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_body(window).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    attempt += 1;
                    let delay =
                        self.retry_delay + Duration::from_millis(rand::random::<u64>() % 250);
                    tracing::warn!(
                        "Events endpoint error (attempt {}): {}; retrying in {:?}",
                        attempt,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_events(&self, window: Option<TimeWindow>) -> Result<Vec<RawEvent>> {
        let key = DataSourceCache::cache_key_for(&self.base_url, window.as_ref());
        if let Some(ref cache) = self.cache
            && let Some(body) = cache.get_text(&key).await
        {
            return parse_events_body(&body);
        }

        tracing::debug!("GET {} {:?}", self.events_url(), Self::query_params(window.as_ref()));
        let body = self.fetch_with_retry(window.as_ref()).await?;
        let records = parse_events_body(&body)?;

        if let Some(ref cache) = self.cache {
            cache.save_text(&key, &body).await;
        }

        Ok(records)
    }

    fn describe(&self) -> String {
        self.events_url()
    }
}
