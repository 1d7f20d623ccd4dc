//! This module defines all error types used throughout the application.

use std::io;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP transport errors talking to the events endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Events endpoint answered with a non-success status
    #[error("Events endpoint returned status {status}: {message}")]
    Endpoint { status: u16, message: String },

    /// Data source errors
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Response parsing errors
    #[error("Parser error: {0}")]
    Parser(String),

    /// Rejected time range input (start after end, missing bound, ...)
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Unparseable instant given on the command line or in the filter prompt
    #[error("Invalid instant '{0}': expected RFC 3339 or YYYY-MM-DD HH:MM[:SS]")]
    InvalidInstant(String),

    /// TUI/visualization errors
    #[error("TUI error: {0}")]
    Tui(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing configuration
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors (logging setup)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a data source error
    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Self::Parser(msg.into())
    }

    /// Create an invalid range error
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder() && !e.is_decode(),
            Error::Endpoint { status, .. } => *status >= 500 || *status == 429,
            Error::Io(_) => true,
            _ => false,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parser(format!("JSON error: {}", err))
    }
}

// Helper macros for creating errors

/// Create a custom error with formatting
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Custom(format!($($arg)*))
    };
}

/// Bail with a custom error message
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::custom_error!($($arg)*))
    };
}

/// Ensure a condition is true or return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::custom("test error");
        assert_eq!(err.to_string(), "test error");

        let err = Error::data_source("connection refused");
        assert_eq!(err.to_string(), "Data source error: connection refused");

        let err = Error::invalid_range("start is after end");
        assert_eq!(err.to_string(), "Invalid range: start is after end");
    }

    #[test]
    fn test_anyhow_context_is_kept() {
        let err: Error = anyhow::anyhow!("already set").context("installing subscriber").into();
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.to_string(), "installing subscriber");
    }

    #[test]
    fn test_retryable_statuses() {
        let server = Error::Endpoint {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(server.is_retryable());

        let not_found = Error::Endpoint {
            status: 404,
            message: "no such machine".into(),
        };
        assert!(!not_found.is_retryable());
        assert!(!Error::invalid_range("x").is_retryable());
    }

    fn checked(value: i32) -> Result<i32> {
        crate::ensure!(value >= 0, "negative value: {}", value);
        Ok(value)
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(checked(3).unwrap(), 3);
        assert_eq!(checked(-1).unwrap_err().to_string(), "negative value: -1");
    }
}
