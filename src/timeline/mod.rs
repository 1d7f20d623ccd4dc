//! Timeline module - Reconstruct and inspect the run/stop step function

pub mod cursor;
pub mod range;
pub mod resolver;
pub mod series;
pub mod summary;
pub mod viewport;
pub mod window;

// Re-export key types
pub use cursor::{CursorController, CursorId, CursorPosition, format_duration, format_instant};
pub use range::{RangeController, RangeLimits, RangePhase};
pub use resolver::state_at;
pub use series::{Density, TimelineSample, assess_density, build_series, events_within};
pub use summary::{WindowSummary, summarize};
pub use viewport::{PlotGeometry, ViewportMapper};
pub use window::TimeWindow;
