//! Query/display window

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed instant range `[start, end]`.
///
/// An inverted window (`start > end`) is representable; consumers treat it
/// as empty rather than as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of `span` ending at `end`
    pub fn ending_at(end: DateTime<Utc>, span: Duration) -> Self {
        Self {
            start: end - span,
            end,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Length of the window; zero when inverted
    pub fn span(&self) -> Duration {
        if self.is_valid() {
            self.end - self.start
        } else {
            Duration::zero()
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Clamp an instant into the window (to `start` when inverted)
    pub fn clamp(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        if !self.is_valid() || instant < self.start {
            self.start
        } else if instant > self.end {
            self.end
        } else {
            instant
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_clamp() {
        let window = TimeWindow::new(at(10, 0), at(10, 30));
        assert_eq!(window.clamp(at(9, 0)), at(10, 0));
        assert_eq!(window.clamp(at(10, 10)), at(10, 10));
        assert_eq!(window.clamp(at(11, 0)), at(10, 30));
    }

    #[test]
    fn test_inverted_window() {
        let window = TimeWindow::new(at(11, 0), at(10, 0));
        assert!(!window.is_valid());
        assert_eq!(window.span(), Duration::zero());
        assert_eq!(window.clamp(at(10, 30)), at(11, 0));
        assert!(!window.contains(at(10, 30)));
    }

    #[test]
    fn test_ending_at() {
        let window = TimeWindow::ending_at(at(12, 0), Duration::hours(1));
        assert_eq!(window.start, at(11, 0));
        assert_eq!(window.span(), Duration::hours(1));
    }
}
