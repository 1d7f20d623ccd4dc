//! Machine Timeline
//!
//! A Terminal UI tool for inspecting a machine's run/stop ("MARCHA"/"PARO")
//! history as a step timeline.
//!
//! This library provides functionality for:
//! - Fetching state-change events from the events endpoint (or mock data)
//! - Normalizing sparse, possibly malformed events into a sorted history
//! - Resolving the state at any instant and building step series
//! - Mapping between plot pixels and time, with two draggable cursors
//! - Managing the query window, filters and zoom

pub mod cli;
pub mod config;
pub mod data_source;
pub mod error;
pub mod timeline;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};

use config::LoggingConfig;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level. With a log file
/// configured, output goes there without colours so the TUI stays clean.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use anyhow::Context;
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .try_init()
                .context("failed to install the log subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .context("failed to install the log subscriber")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "machine-timeline");
    }

    #[test]
    fn test_init_logging_twice_is_an_error() {
        let logging = LoggingConfig::default();
        // Another test may have installed the subscriber already
        let _ = init_logging(&logging);
        assert!(matches!(init_logging(&logging), Err(Error::Other(_))));
    }
}
