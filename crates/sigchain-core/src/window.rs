//! Range selection over sample buffers
//!
//! Two independent windowing schemes:
//! * [`TimeRange`] selects samples by timestamp and feeds the filter chain.
//! * [`IndexWindow`] is a fractional `[0, 1]` view over the sample count,
//!   used for pan and zoom of an already processed series.

use crate::error::{SigError, SigResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Smallest span an [`IndexWindow`] may be zoomed to
pub const MIN_INDEX_SPAN: f64 = 0.001;

/// Time window `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn validate(&self) -> SigResult<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SigError::InvalidWindow {
                reason: format!("Time range [{}, {}] is not finite", self.start, self.end),
            });
        }
        if self.end < self.start {
            return Err(SigError::InvalidWindow {
                reason: format!(
                    "Time range end {:.3} precedes start {:.3}",
                    self.end, self.start
                ),
            });
        }
        Ok(())
    }
}

/// First index whose time is `>= t`, or `None` if every sample is earlier.
///
/// `times` must be non-decreasing.
pub fn first_index_at_or_after(times: &[f64], t: f64) -> Option<usize> {
    let idx = times.partition_point(|&time| time < t);
    (idx < times.len()).then_some(idx)
}

/// Index range covering the samples of `range`.
///
/// The start index is the first sample at or after `range.start`; a miss is
/// reported as [`SigError::RangeNotFound`]. The end index is the first sample
/// at or after `range.end`, or the end of the data when there is none.
pub fn time_window(times: &[f64], range: TimeRange) -> SigResult<Range<usize>> {
    range.validate()?;

    let start = first_index_at_or_after(times, range.start).ok_or(SigError::RangeNotFound {
        start: range.start,
        end: range.end,
    })?;
    let end = first_index_at_or_after(times, range.end).unwrap_or(times.len());

    Ok(start..end.max(start))
}

/// Fractional view window over a sample sequence.
///
/// Always ordered, inside `[0, 1]` and at least [`MIN_INDEX_SPAN`] wide;
/// deserialization goes through [`IndexWindow::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct IndexWindow {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct WindowBounds {
    start: f64,
    end: f64,
}

impl TryFrom<WindowBounds> for IndexWindow {
    type Error = SigError;

    fn try_from(bounds: WindowBounds) -> SigResult<Self> {
        IndexWindow::new(bounds.start, bounds.end)
    }
}

impl Default for IndexWindow {
    fn default() -> Self {
        Self { start: 0.0, end: 1.0 }
    }
}

impl IndexWindow {
    /// Create a window, clamped into `[0, 1]` and ordered
    pub fn new(start: f64, end: f64) -> SigResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(SigError::InvalidWindow {
                reason: format!("Index window [{}, {}] is not finite", start, end),
            });
        }
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let mut window = Self {
            start: lo.clamp(0.0, 1.0),
            end: hi.clamp(0.0, 1.0),
        };
        window.enforce_min_span();
        Ok(window)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_full(&self) -> bool {
        self.start <= 0.0 && self.end >= 1.0
    }

    /// Sample indices covered by the window for a sequence of `len` samples
    pub fn index_range(&self, len: usize) -> Range<usize> {
        let start = (self.start * len as f64).floor() as usize;
        let end = (self.end * len as f64).ceil() as usize;
        let end = end.min(len);
        start.min(end)..end
    }

    /// Zoom by `factor` (< 1 zooms in) keeping `anchor` (fraction within the
    /// current window) fixed on screen
    pub fn zoom(&mut self, factor: f64, anchor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = anchor.clamp(0.0, 1.0);
        let pivot = self.start + anchor * self.span();
        let new_span = (self.span() * factor).clamp(MIN_INDEX_SPAN, 1.0);

        let mut start = pivot - anchor * new_span;
        let mut end = start + new_span;
        if start < 0.0 {
            end -= start;
            start = 0.0;
        }
        if end > 1.0 {
            start -= end - 1.0;
            end = 1.0;
        }
        self.start = start.max(0.0);
        self.end = end;
    }

    /// Shift by `delta` window spans, stopping at the data bounds
    pub fn pan(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let span = self.span().clamp(MIN_INDEX_SPAN, 1.0);
        let shift = delta * span;
        let start = (self.start + shift).clamp(0.0, 1.0 - span);
        self.start = start;
        self.end = start + span;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn enforce_min_span(&mut self) {
        if self.span() >= MIN_INDEX_SPAN {
            return;
        }
        self.end = (self.start + MIN_INDEX_SPAN).min(1.0);
        self.start = self.end - MIN_INDEX_SPAN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times() -> Vec<f64> {
        (0..10).map(|i| i as f64 * 0.5).collect() // 0.0 .. 4.5
    }

    #[test]
    fn test_first_index_at_or_after() {
        let t = times();
        assert_eq!(first_index_at_or_after(&t, 0.0), Some(0));
        assert_eq!(first_index_at_or_after(&t, 0.7), Some(2));
        assert_eq!(first_index_at_or_after(&t, 4.5), Some(9));
        assert_eq!(first_index_at_or_after(&t, 5.0), None);
    }

    #[test]
    fn test_time_window_half_open() {
        let t = times();
        assert_eq!(time_window(&t, TimeRange::new(1.0, 2.0)).unwrap(), 2..4);
    }

    #[test]
    fn test_time_window_end_past_data() {
        let t = times();
        assert_eq!(time_window(&t, TimeRange::new(3.0, 100.0)).unwrap(), 6..10);
    }

    #[test]
    fn test_time_window_start_past_data_is_not_found() {
        let t = times();
        let result = time_window(&t, TimeRange::new(10.0, 20.0));
        assert!(matches!(result, Err(SigError::RangeNotFound { .. })));
    }

    #[test]
    fn test_time_window_empty_input() {
        let result = time_window(&[], TimeRange::new(0.0, 1.0));
        assert!(result.unwrap_err().is_range_miss());
    }

    #[test]
    fn test_time_window_rejects_reversed_range() {
        let t = times();
        let result = time_window(&t, TimeRange::new(2.0, 1.0));
        assert!(matches!(result, Err(SigError::InvalidWindow { .. })));
    }

    #[test]
    fn test_index_window_range() {
        let window = IndexWindow::new(0.25, 0.5).unwrap();
        assert_eq!(window.index_range(100), 25..50);
        assert_eq!(IndexWindow::default().index_range(7), 0..7);
    }

    #[test]
    fn test_index_window_zoom_and_pan() {
        let mut window = IndexWindow::default();
        window.zoom(0.5, 0.5);
        assert!((window.start - 0.25).abs() < 1e-12);
        assert!((window.end - 0.75).abs() < 1e-12);

        window.pan(1.0);
        assert!((window.start - 0.5).abs() < 1e-12);
        assert!((window.end - 1.0).abs() < 1e-12);

        // Clamped at the right edge
        window.pan(1.0);
        assert!((window.end - 1.0).abs() < 1e-12);

        window.reset();
        assert!(window.is_full());
    }

    #[test]
    fn test_index_window_stays_in_bounds() {
        let window = IndexWindow::new(0.8, -0.5).unwrap();
        assert_eq!(window.start(), 0.0);
        assert_eq!(window.end(), 0.8);

        let mut window: IndexWindow =
            serde_json::from_str(r#"{ "start": 0.0, "end": 1.5 }"#).unwrap();
        assert_eq!(window.end(), 1.0);
        window.pan(0.1);
        assert!(window.is_full());

        let mut full = IndexWindow::default();
        full.pan(-3.0);
        full.zoom(4.0, 0.5);
        assert!(full.is_full());
    }

    #[test]
    fn test_index_window_min_span() {
        let mut window = IndexWindow::default();
        for _ in 0..100 {
            window.zoom(0.1, 0.0);
        }
        assert!(window.span() >= MIN_INDEX_SPAN - 1e-12);
    }
}
