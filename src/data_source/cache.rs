//! Caching component
//!
//! Stores raw events endpoint bodies on disk, keyed by endpoint and query
//! window, so that re-applying the same filter does not hit the network.

use crate::timeline::TimeWindow;
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;

/// Data Source Cache
#[derive(Debug, Clone)]
pub struct DataSourceCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl DataSourceCache {
    /// Create a new cache instance
    pub fn new(ttl: Duration, cache_dir: Option<PathBuf>) -> Self {
        let cache_dir = cache_dir.unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("machine-timeline")
        });

        Self { cache_dir, ttl }
    }

    pub fn cache_key_for(endpoint: &str, window: Option<&TimeWindow>) -> String {
        let endpoint: String = endpoint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        match window {
            Some(w) => format!(
                "events_{}_{}_{}",
                endpoint,
                w.start.timestamp(),
                w.end.timestamp()
            ),
            None => format!("events_{}_latest", endpoint),
        }
    }

    /// Get cache file path
    fn get_cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Check if cache is valid
    async fn is_cache_valid(&self, path: &Path) -> bool {
        let Ok(metadata) = fs::metadata(path).await else {
            return false;
        };
        match metadata.modified() {
            Ok(modified) => SystemTime::now()
                .duration_since(modified)
                .map(|elapsed| elapsed < self.ttl)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Ensure cache directory exists
    async fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(crate::Error::Io)?;
        }
        Ok(())
    }

    /// Get raw text content from cache
    pub async fn get_text(&self, key: &str) -> Option<String> {
        let path = self.get_cache_path(key);
        if self.is_cache_valid(&path).await {
            match fs::read_to_string(&path).await {
                Ok(content) => {
                    tracing::debug!("Cache hit for key {}", key);
                    return Some(content);
                }
                Err(e) => tracing::warn!("Failed to read cached text: {}", e),
            }
        }
        None
    }

    /// Save raw text content to cache
    pub async fn save_text(&self, key: &str, content: &str) {
        if let Err(e) = self.ensure_cache_dir().await {
            tracing::warn!("Failed to create cache directory: {}", e);
            return;
        }

        let path = self.get_cache_path(key);
        if let Err(e) = fs::write(&path, content).await {
            tracing::warn!("Failed to write text to cache: {}", e);
        }
    }
}
