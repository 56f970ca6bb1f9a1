//! SampleBuffer: immutable per-channel container for time-indexed samples

use crate::error::{SigError, SigResult};
use crate::window::{time_window, TimeRange};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Ordered `(time, value)` samples for one channel.
///
/// Stored as two parallel vectors so the value slice can be handed straight
/// to the filter chain. Times are non-decreasing and every sample is finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBuffer {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl SampleBuffer {
    /// Create a buffer from parallel time and value vectors
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> SigResult<Self> {
        if times.len() != values.len() {
            return Err(SigError::InvalidSignalData {
                reason: format!(
                    "Time column has {} samples but value column has {}",
                    times.len(),
                    values.len()
                ),
            });
        }

        if let Some(idx) = times
            .iter()
            .zip(&values)
            .position(|(t, v)| !t.is_finite() || !v.is_finite())
        {
            return Err(SigError::InvalidSignalData {
                reason: format!("Sample {} is not finite", idx),
            });
        }

        if let Some(idx) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(SigError::InvalidSignalData {
                reason: format!(
                    "Times decrease at sample {} ({:.6} -> {:.6})",
                    idx + 1,
                    times[idx],
                    times[idx + 1]
                ),
            });
        }

        Ok(SampleBuffer { times, values })
    }

    /// Create a buffer from `(time, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> SigResult<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (times, values) = pairs.into_iter().unzip();
        Self::new(times, values)
    }

    /// Uniformly sampled buffer starting at t = 0
    pub fn uniform(values: Vec<f64>, sampling_rate: f64) -> SigResult<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(SigError::InvalidSignalData {
                reason: format!("Sampling rate {} must be positive", sampling_rate),
            });
        }
        let dt = 1.0 / sampling_rate;
        let times = (0..values.len()).map(|i| i as f64 * dt).collect();
        Self::new(times, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sample at `index` as a `(time, value)` pair
    pub fn sample(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.times.get(index)?, *self.values.get(index)?))
    }

    /// Iterate over `(time, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Time span covered by the buffer in seconds
    pub fn duration(&self) -> f64 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Sampling rate estimated from the mean sample spacing.
    ///
    /// `None` when fewer than two samples or all times are equal.
    pub fn estimated_sampling_rate(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        let span = self.duration();
        if span <= 0.0 {
            return None;
        }
        Some((self.len() - 1) as f64 / span)
    }

    /// Copy of the samples in an index range
    pub fn slice(&self, range: Range<usize>) -> SigResult<SampleBuffer> {
        if range.start > range.end || range.end > self.len() {
            return Err(SigError::InvalidWindow {
                reason: format!(
                    "Index range {}..{} out of bounds for {} samples",
                    range.start,
                    range.end,
                    self.len()
                ),
            });
        }

        Ok(SampleBuffer {
            times: self.times[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
        })
    }

    /// Copy of the samples inside a time window
    pub fn window(&self, range: TimeRange) -> SigResult<SampleBuffer> {
        let indices = time_window(&self.times, range)?;
        self.slice(indices)
    }

    /// Basic statistics over the values
    pub fn stats(&self) -> ChannelStats {
        ChannelStats::calculate(&self.values)
    }
}

/// Basic statistics for a signal channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl ChannelStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;

        let sum_sq: f64 = data.iter().map(|x| x * x).sum();
        let rms = (sum_sq / n).sqrt();

        // Population variance
        let variance: f64 = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}
