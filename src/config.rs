//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Environment variables
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no endpoint URL is configured
pub const ENDPOINT_URL_ENV: &str = "MACHINE_EVENTS_URL";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,

    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub range: RangeConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Machine identifier shown in the UI
    #[serde(default = "default_machine")]
    pub machine: String,

    #[serde(default = "default_source")]
    pub source: String,
}

/// Events endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL; `/eventos` is appended
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Query window limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    /// How far back a filter may reach
    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: u32,

    /// Fallback window when nothing has been loaded yet
    #[serde(default = "default_window_mins")]
    pub default_window_mins: u32,
}

/// Chart presentation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_max_events_per_pixel")]
    pub max_events_per_pixel: f64,

    /// Cursor grab distance, in terminal columns
    #[serde(default = "default_cursor_grab_threshold")]
    pub cursor_grab_threshold: f64,

    /// Watch mode refresh period
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable caching
    #[serde(default)]
    pub enabled: bool,

    /// Cache directory
    pub directory: Option<PathBuf>,

    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

// Default value functions

fn default_machine() -> String {
    "maquina-1".to_string()
}

fn default_source() -> String {
    "http".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_lookback_days() -> u32 {
    90
}

fn default_window_mins() -> u32 {
    60
}

fn default_max_events_per_pixel() -> f64 {
    1.0
}

fn default_cursor_grab_threshold() -> f64 {
    2.0
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            machine: default_machine(),
            source: default_source(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            max_lookback_days: default_max_lookback_days(),
            default_window_mins: default_window_mins(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_events_per_pixel: default_max_events_per_pixel(),
            cursor_grab_threshold: default_cursor_grab_threshold(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: None,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl RangeConfig {
    pub fn max_lookback(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.max_lookback_days))
    }

    pub fn default_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.default_window_mins))
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./config.toml
    /// 2. ~/.machine-timeline/config.toml
    /// 3. /etc/machine-timeline/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".machine-timeline").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/machine-timeline/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Get the events endpoint base URL from config or environment
    pub fn endpoint_url(&self) -> Result<String> {
        if let Some(url) = &self.endpoint.base_url {
            return Ok(url.clone());
        }

        std::env::var(ENDPOINT_URL_ENV).map_err(|_| {
            Error::MissingConfig(format!(
                "Events endpoint URL not found. Set {} or configure [endpoint] base_url",
                ENDPOINT_URL_ENV
            ))
        })
    }

    /// Get cache directory with fallback to default
    pub fn cache_directory(&self) -> PathBuf {
        self.cache.directory.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|c| c.join("machine-timeline"))
                .unwrap_or_else(|| std::env::temp_dir().join("machine-timeline-cache"))
        })
    }
}
