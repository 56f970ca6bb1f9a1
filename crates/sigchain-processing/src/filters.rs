//! Filter stages for the processing chain
//!
//! Every stage maps a sample sequence to a new sequence of the same length.
//! The "Butterworth" lowpass/highpass family is a single-pole exponential
//! smoother, not a true IIR design; the notch is a real biquad.

use crate::processor::SignalTransform;
use sigchain_core::{processing_error, SigError, SigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Upper bound on the exponential smoothing coefficient
pub const ALPHA_CAP: f64 = 0.99;

/// Filter kinds supported by the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Remove least-squares linear trend
    Detrend,
    /// Min-max scaling to [0, 1]
    Normalize,
    /// Z-score
    Standardize,
    /// Exponential smoothing lowpass
    Lowpass,
    /// Complement of the lowpass
    Highpass,
    /// Lowpass at `high` followed by highpass at `low`
    Bandpass,
    /// Lowpass/highpass recombination
    Bandstop,
    /// Savitzky-Golay, approximated by a centered mean
    Savgol,
    /// Centered running median
    Median,
    /// Biquad notch for powerline interference
    Notch,
    /// Centered running mean, clipped at the edges
    MovingAverage,
}

impl FilterKind {
    pub const ALL: [FilterKind; 11] = [
        FilterKind::Detrend,
        FilterKind::Normalize,
        FilterKind::Standardize,
        FilterKind::Lowpass,
        FilterKind::Highpass,
        FilterKind::Bandpass,
        FilterKind::Bandstop,
        FilterKind::Savgol,
        FilterKind::Median,
        FilterKind::Notch,
        FilterKind::MovingAverage,
    ];

    /// Serialized name
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Detrend => "detrend",
            FilterKind::Normalize => "normalize",
            FilterKind::Standardize => "standardize",
            FilterKind::Lowpass => "lowpass",
            FilterKind::Highpass => "highpass",
            FilterKind::Bandpass => "bandpass",
            FilterKind::Bandstop => "bandstop",
            FilterKind::Savgol => "savgol",
            FilterKind::Median => "median",
            FilterKind::Notch => "notch",
            FilterKind::MovingAverage => "moving_average",
        }
    }

    /// Human readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterKind::Detrend => "Detrend",
            FilterKind::Normalize => "Normalize (0-1)",
            FilterKind::Standardize => "Standardize (z-score)",
            FilterKind::Lowpass => "Butterworth Lowpass",
            FilterKind::Highpass => "Butterworth Highpass",
            FilterKind::Bandpass => "Butterworth Bandpass",
            FilterKind::Bandstop => "Butterworth Bandstop",
            FilterKind::Savgol => "Savitzky-Golay",
            FilterKind::Median => "Median Filter",
            FilterKind::Notch => "Notch Filter",
            FilterKind::MovingAverage => "Moving Average",
        }
    }

    /// Parameter names declared for this kind, in display order
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            FilterKind::Detrend | FilterKind::Normalize | FilterKind::Standardize => &[],
            FilterKind::Lowpass | FilterKind::Highpass => &["cutoff", "order"],
            FilterKind::Bandpass | FilterKind::Bandstop => &["low", "high", "order"],
            FilterKind::Savgol => &["window", "polyorder"],
            FilterKind::Median => &["kernel"],
            FilterKind::Notch => &["frequency", "quality"],
            FilterKind::MovingAverage => &["window"],
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.parameter_names().contains(&name)
    }

    /// Stage of this kind with default parameters
    pub fn default_stage(&self) -> FilterStage {
        match self {
            FilterKind::Detrend => FilterStage::Detrend,
            FilterKind::Normalize => FilterStage::Normalize,
            FilterKind::Standardize => FilterStage::Standardize,
            FilterKind::Lowpass => FilterStage::Lowpass(CutoffParams { cutoff: 50.0, order: 4.0 }),
            FilterKind::Highpass => FilterStage::Highpass(CutoffParams { cutoff: 1.0, order: 4.0 }),
            FilterKind::Bandpass => FilterStage::Bandpass(BandParams {
                low: 1.0,
                high: 50.0,
                order: 4.0,
            }),
            FilterKind::Bandstop => FilterStage::Bandstop(BandParams {
                low: 48.0,
                high: 52.0,
                order: 4.0,
            }),
            FilterKind::Savgol => FilterStage::Savgol(SavgolParams {
                window: 11.0,
                polyorder: 3.0,
            }),
            FilterKind::Median => FilterStage::Median(MedianParams { kernel: 5.0 }),
            FilterKind::Notch => FilterStage::Notch(NotchParams {
                frequency: 50.0,
                quality: 30.0,
            }),
            FilterKind::MovingAverage => FilterStage::MovingAverage(WindowParams { window: 5.0 }),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = SigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SigError::UnknownFilterKind { kind: s.to_string() })
    }
}

/// Cutoff parameters for lowpass/highpass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffParams {
    /// Cutoff frequency (Hz)
    pub cutoff: f64,
    /// Nominal order; the single-pole approximation ignores it
    pub order: f64,
}

/// Band edges for bandpass/bandstop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    pub low: f64,
    pub high: f64,
    pub order: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavgolParams {
    pub window: f64,
    /// Accepted for compatibility, not used by the approximation
    pub polyorder: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianParams {
    pub kernel: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotchParams {
    /// Notch frequency (Hz) - typically 50 or 60
    pub frequency: f64,
    /// Quality factor
    pub quality: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    pub window: f64,
}

/// A single parameterized transform in the chain
#[derive(Debug, Clone, PartialEq)]
pub enum FilterStage {
    Detrend,
    Normalize,
    Standardize,
    Lowpass(CutoffParams),
    Highpass(CutoffParams),
    Bandpass(BandParams),
    Bandstop(BandParams),
    Savgol(SavgolParams),
    Median(MedianParams),
    Notch(NotchParams),
    MovingAverage(WindowParams),
}

impl FilterStage {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterStage::Detrend => FilterKind::Detrend,
            FilterStage::Normalize => FilterKind::Normalize,
            FilterStage::Standardize => FilterKind::Standardize,
            FilterStage::Lowpass(_) => FilterKind::Lowpass,
            FilterStage::Highpass(_) => FilterKind::Highpass,
            FilterStage::Bandpass(_) => FilterKind::Bandpass,
            FilterStage::Bandstop(_) => FilterKind::Bandstop,
            FilterStage::Savgol(_) => FilterKind::Savgol,
            FilterStage::Median(_) => FilterKind::Median,
            FilterStage::Notch(_) => FilterKind::Notch,
            FilterStage::MovingAverage(_) => FilterKind::MovingAverage,
        }
    }

    /// Lowpass stage
    pub fn lowpass(cutoff: f64, order: f64) -> Self {
        FilterStage::Lowpass(CutoffParams { cutoff, order })
    }

    /// Highpass stage
    pub fn highpass(cutoff: f64, order: f64) -> Self {
        FilterStage::Highpass(CutoffParams { cutoff, order })
    }

    /// Bandpass stage
    pub fn bandpass(low: f64, high: f64, order: f64) -> Self {
        FilterStage::Bandpass(BandParams { low, high, order })
    }

    /// Bandstop stage
    pub fn bandstop(low: f64, high: f64, order: f64) -> Self {
        FilterStage::Bandstop(BandParams { low, high, order })
    }

    /// Notch stage
    pub fn notch(frequency: f64, quality: f64) -> Self {
        FilterStage::Notch(NotchParams { frequency, quality })
    }

    pub fn median(kernel: f64) -> Self {
        FilterStage::Median(MedianParams { kernel })
    }

    pub fn moving_average(window: f64) -> Self {
        FilterStage::MovingAverage(WindowParams { window })
    }

    pub fn savgol(window: f64, polyorder: f64) -> Self {
        FilterStage::Savgol(SavgolParams { window, polyorder })
    }

    /// Read a declared parameter by name
    pub fn param(&self, name: &str) -> Option<f64> {
        match (self, name) {
            (FilterStage::Lowpass(p) | FilterStage::Highpass(p), "cutoff") => Some(p.cutoff),
            (FilterStage::Lowpass(p) | FilterStage::Highpass(p), "order") => Some(p.order),
            (FilterStage::Bandpass(p) | FilterStage::Bandstop(p), "low") => Some(p.low),
            (FilterStage::Bandpass(p) | FilterStage::Bandstop(p), "high") => Some(p.high),
            (FilterStage::Bandpass(p) | FilterStage::Bandstop(p), "order") => Some(p.order),
            (FilterStage::Savgol(p), "window") => Some(p.window),
            (FilterStage::Savgol(p), "polyorder") => Some(p.polyorder),
            (FilterStage::Median(p), "kernel") => Some(p.kernel),
            (FilterStage::Notch(p), "frequency") => Some(p.frequency),
            (FilterStage::Notch(p), "quality") => Some(p.quality),
            (FilterStage::MovingAverage(p), "window") => Some(p.window),
            _ => None,
        }
    }

    /// Update a declared parameter; unknown names and non-finite values are
    /// rejected and leave the stage unchanged
    pub fn set_param(&mut self, name: &str, value: f64) -> SigResult<()> {
        let kind = self.kind();
        if !kind.declares(name) {
            return Err(SigError::UnknownParameter {
                kind: kind.as_str().to_string(),
                name: name.to_string(),
            });
        }
        if !value.is_finite() {
            return Err(SigError::InvalidParameterValue {
                name: name.to_string(),
                value,
            });
        }

        let slot = match (self, name) {
            (FilterStage::Lowpass(p) | FilterStage::Highpass(p), "cutoff") => &mut p.cutoff,
            (FilterStage::Lowpass(p) | FilterStage::Highpass(p), "order") => &mut p.order,
            (FilterStage::Bandpass(p) | FilterStage::Bandstop(p), "low") => &mut p.low,
            (FilterStage::Bandpass(p) | FilterStage::Bandstop(p), "high") => &mut p.high,
            (FilterStage::Bandpass(p) | FilterStage::Bandstop(p), "order") => &mut p.order,
            (FilterStage::Savgol(p), "window") => &mut p.window,
            (FilterStage::Savgol(p), "polyorder") => &mut p.polyorder,
            (FilterStage::Median(p), "kernel") => &mut p.kernel,
            (FilterStage::Notch(p), "frequency") => &mut p.frequency,
            (FilterStage::Notch(p), "quality") => &mut p.quality,
            (FilterStage::MovingAverage(p), "window") => &mut p.window,
            _ => {
                return Err(SigError::UnknownParameter {
                    kind: kind.as_str().to_string(),
                    name: name.to_string(),
                })
            }
        };
        *slot = value;
        Ok(())
    }

    /// Parameters keyed by their serialized names
    pub fn params(&self) -> BTreeMap<String, f64> {
        self.kind()
            .parameter_names()
            .iter()
            .filter_map(|name| self.param(name).map(|v| (name.to_string(), v)))
            .collect()
    }

    /// Build a stage from a serialized parameter map. The key set must match
    /// the kind's declared parameters exactly.
    pub fn from_params(kind: FilterKind, params: &BTreeMap<String, f64>) -> SigResult<Self> {
        if let Some(unknown) = params.keys().find(|name| !kind.declares(name)) {
            return Err(SigError::UnknownParameter {
                kind: kind.as_str().to_string(),
                name: unknown.clone(),
            });
        }

        let mut stage = kind.default_stage();
        for name in kind.parameter_names() {
            let value = params.get(*name).ok_or_else(|| SigError::MissingParameter {
                kind: kind.as_str().to_string(),
                name: name.to_string(),
            })?;
            stage.set_param(name, *value)?;
        }
        Ok(stage)
    }

    /// Short description, e.g. `lowpass(cutoff=50, order=4)`
    pub fn describe(&self) -> String {
        let params = self
            .kind()
            .parameter_names()
            .iter()
            .filter_map(|name| self.param(name).map(|v| format!("{}={}", name, v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.kind(), params)
    }

    /// Apply the stage to `signal`.
    ///
    /// Degenerate input (empty, constant, window wider than the signal)
    /// yields the input unchanged. Parameters that make the stage
    /// meaningless at this sampling rate yield `Err`; the chain turns that
    /// into a pass-through.
    pub fn apply(&self, signal: &[f64], sampling_rate: f64) -> SigResult<Vec<f64>> {
        match self {
            FilterStage::Detrend => Ok(detrend(signal)),
            FilterStage::Normalize => Ok(normalize(signal)),
            FilterStage::Standardize => Ok(standardize(signal)),
            FilterStage::Lowpass(p) => lowpass(signal, p.cutoff, sampling_rate),
            FilterStage::Highpass(p) => highpass(signal, p.cutoff, sampling_rate),
            FilterStage::Bandpass(p) => bandpass(signal, p.low, p.high, sampling_rate),
            FilterStage::Bandstop(p) => bandstop(signal, p.low, p.high, sampling_rate),
            FilterStage::Savgol(p) => Ok(savgol_smooth(signal, sample_count(p.window))),
            FilterStage::Median(p) => Ok(median(signal, sample_count(p.kernel))),
            FilterStage::Notch(p) => notch(signal, p.frequency, p.quality, sampling_rate),
            FilterStage::MovingAverage(p) => Ok(moving_average(signal, sample_count(p.window))),
        }
    }
}

impl SignalTransform for FilterStage {
    fn apply(&self, signal: &[f64], sampling_rate: f64) -> SigResult<Vec<f64>> {
        FilterStage::apply(self, signal, sampling_rate)
    }

    fn name(&self) -> &str {
        self.kind().display_name()
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Integer-like parameter as a sample count; negative and non-finite give 0
fn sample_count(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value as usize
    } else {
        0
    }
}

/// Subtract the least-squares line fitted against sample index
pub fn detrend(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n < 2 {
        return signal.to_vec();
    }

    let mean_i = (n - 1) as f64 / 2.0;
    let mean_y = signal.iter().sum::<f64>() / n as f64;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in signal.iter().enumerate() {
        let di = i as f64 - mean_i;
        num += di * (y - mean_y);
        den += di * di;
    }
    if den == 0.0 {
        return signal.to_vec();
    }

    let slope = num / den;
    let intercept = mean_y - slope * mean_i;
    signal
        .iter()
        .enumerate()
        .map(|(i, &y)| y - (slope * i as f64 + intercept))
        .collect()
}

/// Min-max scale into [0, 1]
pub fn normalize(signal: &[f64]) -> Vec<f64> {
    let min = signal.iter().copied().fold(f64::INFINITY, f64::min);
    let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if signal.is_empty() || range == 0.0 {
        return signal.to_vec();
    }
    signal.iter().map(|v| (v - min) / range).collect()
}

/// Z-score using the population standard deviation
pub fn standardize(signal: &[f64]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }
    let n = signal.len() as f64;
    let mean = signal.iter().sum::<f64>() / n;
    let std_dev = (signal.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std_dev == 0.0 {
        return signal.to_vec();
    }
    signal.iter().map(|v| (v - mean) / std_dev).collect()
}

/// Smoothing coefficient for a cutoff: normalized cutoff capped at [`ALPHA_CAP`]
pub fn smoothing_alpha(cutoff: f64, sampling_rate: f64) -> SigResult<f64> {
    if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
        return Err(processing_error!("sampling rate {} must be positive", sampling_rate));
    }
    if !(cutoff.is_finite() && cutoff > 0.0) {
        return Err(processing_error!("cutoff {} Hz must be positive", cutoff));
    }
    let nyquist = sampling_rate / 2.0;
    Ok((cutoff / nyquist).min(ALPHA_CAP))
}

/// Single-pole exponential smoothing lowpass, `y[0] = x[0]`
pub fn lowpass(signal: &[f64], cutoff: f64, sampling_rate: f64) -> SigResult<Vec<f64>> {
    let alpha = smoothing_alpha(cutoff, sampling_rate)?;
    let mut output = Vec::with_capacity(signal.len());
    let mut prev = match signal.first() {
        Some(&first) => first,
        None => return Ok(output),
    };
    output.push(prev);
    for &x in &signal[1..] {
        prev = alpha * x + (1.0 - alpha) * prev;
        output.push(prev);
    }
    Ok(output)
}

/// Signal minus its lowpass-smoothed version
pub fn highpass(signal: &[f64], cutoff: f64, sampling_rate: f64) -> SigResult<Vec<f64>> {
    let smoothed = lowpass(signal, cutoff, sampling_rate)?;
    Ok(signal.iter().zip(&smoothed).map(|(x, s)| x - s).collect())
}

/// Lowpass at `high`, then highpass at `low`
pub fn bandpass(signal: &[f64], low: f64, high: f64, sampling_rate: f64) -> SigResult<Vec<f64>> {
    let smoothed = lowpass(signal, high, sampling_rate)?;
    highpass(&smoothed, low, sampling_rate)
}

/// `lowpass(x, low) + highpass(x, high) - x`
pub fn bandstop(signal: &[f64], low: f64, high: f64, sampling_rate: f64) -> SigResult<Vec<f64>> {
    let low_band = lowpass(signal, low, sampling_rate)?;
    let high_band = highpass(signal, high, sampling_rate)?;
    Ok(signal
        .iter()
        .zip(low_band.iter().zip(&high_band))
        .map(|(x, (l, h))| l + h - x)
        .collect())
}

fn prefix_sums(signal: &[f64]) -> Vec<f64> {
    let mut sums = Vec::with_capacity(signal.len() + 1);
    let mut acc = 0.0;
    sums.push(acc);
    for &v in signal {
        acc += v;
        sums.push(acc);
    }
    sums
}

/// Savitzky-Golay approximation: centered mean over `2*(window/2)+1`
/// samples, edges unmodified
pub fn savgol_smooth(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    let half = window / 2;
    let mut output = signal.to_vec();
    if half == 0 || n <= 2 * half {
        return output;
    }

    let sums = prefix_sums(signal);
    let width = (2 * half + 1) as f64;
    for i in half..n - half {
        output[i] = (sums[i + half + 1] - sums[i - half]) / width;
    }
    output
}

/// Centered running median over `2*(kernel/2)+1` samples, edges unmodified
pub fn median(signal: &[f64], kernel: usize) -> Vec<f64> {
    let n = signal.len();
    let half = kernel / 2;
    let mut output = signal.to_vec();
    if half == 0 || n <= 2 * half {
        return output;
    }

    let mut window = Vec::with_capacity(2 * half + 1);
    for i in half..n - half {
        window.clear();
        window.extend_from_slice(&signal[i - half..=i + half]);
        window.sort_by(|a, b| a.total_cmp(b));
        output[i] = window[half];
    }
    output
}

/// Centered mean with `window/2` samples each side, clipped at the bounds
pub fn moving_average(signal: &[f64], window: usize) -> Vec<f64> {
    let n = signal.len();
    let half = window / 2;
    if half == 0 || n == 0 {
        return signal.to_vec();
    }

    let sums = prefix_sums(signal);
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            (sums[hi + 1] - sums[lo]) / (hi - lo + 1) as f64
        })
        .collect()
}

/// Second-order section, coefficients normalized by a0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// Notch at `frequency` with quality `quality`
    pub fn notch(frequency: f64, quality: f64, sampling_rate: f64) -> SigResult<Self> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(processing_error!("sampling rate {} must be positive", sampling_rate));
        }
        let nyquist = sampling_rate / 2.0;
        if !(frequency.is_finite() && frequency > 0.0 && frequency < nyquist) {
            return Err(processing_error!(
                "notch frequency {} Hz must lie in (0, {}) Hz",
                frequency,
                nyquist
            ));
        }
        if !(quality.is_finite() && quality > 0.0) {
            return Err(processing_error!("notch quality {} must be positive", quality));
        }

        let omega = 2.0 * std::f64::consts::PI * frequency / sampling_rate;
        let alpha = omega.sin() / (2.0 * quality);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        Ok(Biquad {
            b0: 1.0 / a0,
            b1: -2.0 * cos_omega / a0,
            b2: 1.0 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        })
    }

    /// Run the recurrence from index 2; samples 0 and 1 pass through and
    /// seed the history
    pub fn filter(&self, signal: &[f64]) -> Vec<f64> {
        let mut output = signal.to_vec();
        for i in 2..signal.len() {
            output[i] = self.b0 * signal[i] + self.b1 * signal[i - 1] + self.b2 * signal[i - 2]
                - self.a1 * output[i - 1]
                - self.a2 * output[i - 2];
        }
        output
    }
}

/// Biquad notch filter
pub fn notch(signal: &[f64], frequency: f64, quality: f64, sampling_rate: f64) -> SigResult<Vec<f64>> {
    let biquad = Biquad::notch(frequency, quality, sampling_rate)?;
    Ok(biquad.filter(signal))
}
