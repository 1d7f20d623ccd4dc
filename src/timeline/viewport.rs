//! Pixel <-> time mapping for the plot area
//!
//! A `ViewportMapper` is a plain value built from the active window and the
//! plot geometry measured for the current frame. Callers rebuild it whenever
//! they need one instead of keeping it across layout changes.

use super::TimeWindow;
use chrono::{DateTime, Duration, Utc};

/// Default cursor grab distance for pixel-based hosts
pub const DEFAULT_GRAB_THRESHOLD_PX: f64 = 12.0;

/// Measured geometry of the rendered plot container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlotGeometry {
    /// Left edge of the container
    pub left: f64,
    /// Container width
    pub width: f64,
    /// Inset from the left edge to the first plotted pixel
    pub margin_left: f64,
    /// Inset from the right edge to the last plotted pixel
    pub margin_right: f64,
}

impl PlotGeometry {
    pub fn new(left: f64, width: f64) -> Self {
        Self {
            left,
            width,
            margin_left: 0.0,
            margin_right: 0.0,
        }
    }

    pub fn with_margins(mut self, left: f64, right: f64) -> Self {
        self.margin_left = left;
        self.margin_right = right;
        self
    }

    /// First and last plottable pixel, never inverted
    pub fn pixel_range(&self) -> (f64, f64) {
        let min = self.left + self.margin_left;
        let max = (self.left + self.width - 1.0 - self.margin_right).max(min);
        (min, max)
    }

    /// Number of horizontal pixels available for plotting
    pub fn plot_width(&self) -> f64 {
        let (min, max) = self.pixel_range();
        max - min + 1.0
    }
}

/// Linear mapping between a time domain and a pixel range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMapper {
    domain: TimeWindow,
    pixel_min: f64,
    pixel_max: f64,
}

impl ViewportMapper {
    pub fn new(domain: TimeWindow, pixel_min: f64, pixel_max: f64) -> Self {
        Self {
            domain,
            pixel_min,
            pixel_max: pixel_max.max(pixel_min),
        }
    }

    pub fn from_geometry(domain: TimeWindow, geometry: &PlotGeometry) -> Self {
        let (min, max) = geometry.pixel_range();
        Self::new(domain, min, max)
    }

    pub fn domain(&self) -> &TimeWindow {
        &self.domain
    }

    pub fn pixel_range(&self) -> (f64, f64) {
        (self.pixel_min, self.pixel_max)
    }

    fn span_ms(&self) -> i64 {
        self.domain.span().num_milliseconds()
    }

    fn width(&self) -> f64 {
        self.pixel_max - self.pixel_min
    }

    /// Pixel for an instant; instants outside the domain map to its edges
    pub fn time_to_pixel(&self, instant: DateTime<Utc>) -> f64 {
        let span = self.span_ms();
        if span <= 0 {
            return self.pixel_min;
        }
        let offset = (self.domain.clamp(instant) - self.domain.start).num_milliseconds();
        self.pixel_min + (offset as f64 / span as f64) * self.width()
    }

    /// Instant for a pixel, at millisecond resolution; pixels outside the
    /// range map to the domain edges
    pub fn pixel_to_time(&self, pixel: f64) -> DateTime<Utc> {
        let span = self.span_ms();
        let width = self.width();
        if span <= 0 || width <= 0.0 || !pixel.is_finite() {
            return self.domain.start;
        }
        let fraction = ((pixel - self.pixel_min) / width).clamp(0.0, 1.0);
        let offset = (fraction * span as f64).round() as i64;
        self.domain.clamp(self.domain.start + Duration::milliseconds(offset))
    }

    /// Time covered by one pixel
    pub fn time_per_pixel(&self) -> Duration {
        let width = self.width();
        if width <= 0.0 {
            return self.domain.span();
        }
        Duration::milliseconds((self.span_ms() as f64 / width).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, s).unwrap()
    }

    fn mapper() -> ViewportMapper {
        ViewportMapper::new(TimeWindow::new(at(10, 0, 0), at(10, 30, 0)), 100.0, 400.0)
    }

    #[test]
    fn test_edges() {
        let m = mapper();
        assert_eq!(m.time_to_pixel(at(10, 0, 0)), 100.0);
        assert_eq!(m.time_to_pixel(at(10, 30, 0)), 400.0);
        assert_eq!(m.time_to_pixel(at(10, 15, 0)), 250.0);
        assert_eq!(m.pixel_to_time(100.0), at(10, 0, 0));
        assert_eq!(m.pixel_to_time(400.0), at(10, 30, 0));
        assert_eq!(m.pixel_to_time(250.0), at(10, 15, 0));
    }

    #[test]
    fn test_clamps_out_of_domain() {
        let m = mapper();
        assert_eq!(m.time_to_pixel(at(9, 0, 0)), 100.0);
        assert_eq!(m.time_to_pixel(at(11, 0, 0)), 400.0);
        assert_eq!(m.pixel_to_time(-50.0), at(10, 0, 0));
        assert_eq!(m.pixel_to_time(10_000.0), at(10, 30, 0));
        assert_eq!(m.pixel_to_time(f64::NAN), at(10, 0, 0));
    }

    #[test]
    fn test_round_trip() {
        let m = mapper();
        for second in (0..1800).step_by(37) {
            let t = at(10, 0, 0) + Duration::seconds(second);
            let back = m.pixel_to_time(m.time_to_pixel(t));
            assert!((back - t).num_milliseconds().abs() <= 1, "{} -> {}", t, back);
        }
    }

    #[test]
    fn test_degenerate_domain() {
        let m = ViewportMapper::new(TimeWindow::new(at(10, 0, 0), at(10, 0, 0)), 0.0, 80.0);
        assert_eq!(m.time_to_pixel(at(10, 0, 0)), 0.0);
        assert_eq!(m.pixel_to_time(40.0), at(10, 0, 0));

        let inverted = ViewportMapper::new(TimeWindow::new(at(11, 0, 0), at(10, 0, 0)), 0.0, 80.0);
        assert_eq!(inverted.pixel_to_time(40.0), at(11, 0, 0));
    }

    #[test]
    fn test_geometry_with_margins() {
        let geometry = PlotGeometry::new(10.0, 102.0).with_margins(1.0, 1.0);
        assert_eq!(geometry.pixel_range(), (11.0, 110.0));
        assert_eq!(geometry.plot_width(), 100.0);

        let m = ViewportMapper::from_geometry(TimeWindow::new(at(10, 0, 0), at(10, 30, 0)), &geometry);
        assert_eq!(m.pixel_range(), (11.0, 110.0));
    }

    #[test]
    fn test_resize_changes_mapping() {
        let window = TimeWindow::new(at(10, 0, 0), at(10, 30, 0));
        let narrow = ViewportMapper::from_geometry(window, &PlotGeometry::new(0.0, 61.0));
        let wide = ViewportMapper::from_geometry(window, &PlotGeometry::new(0.0, 181.0));
        assert_eq!(narrow.pixel_to_time(30.0), at(10, 15, 0));
        assert_eq!(wide.pixel_to_time(30.0), at(10, 5, 0));
        assert_eq!(narrow.time_per_pixel(), Duration::seconds(30));
    }
}
