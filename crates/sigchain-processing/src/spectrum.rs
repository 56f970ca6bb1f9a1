//! Spectral estimation: single-sided magnitude spectrum and dB PSD
//!
//! Bins `k = 0..N/2` at `k * sr / N` Hz, magnitude scaled as `2|X_k|/N` so
//! a sine of amplitude `A` sitting on a bin reads `A`.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Practical sample ceiling for the O(N²) direct transform
pub const MAX_INTERACTIVE_DFT_SAMPLES: usize = 20_000;

/// Floor added to squared magnitudes before taking the log
pub const PSD_EPSILON: f64 = 1e-10;

/// Frequency-domain series with ascending frequencies
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectralResult {
    pub frequencies: Vec<f64>,
    pub values: Vec<f64>,
}

impl SpectralResult {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Drop bins above `max_frequency`
    pub fn truncate_to(&mut self, max_frequency: f64) {
        let keep = self.frequencies.partition_point(|&f| f <= max_frequency);
        self.frequencies.truncate(keep);
        self.values.truncate(keep);
    }

    /// `(frequency, value)` of the largest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Value of the bin nearest to `frequency`
    pub fn value_near(&self, frequency: f64) -> Option<f64> {
        let index = self
            .frequencies
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - frequency).abs().total_cmp(&(b.1 - frequency).abs()))?
            .0;
        self.values.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies.iter().copied().zip(self.values.iter().copied())
    }
}

fn frequency_axis(n: usize, sampling_rate: f64) -> Vec<f64> {
    (0..n / 2).map(|k| k as f64 * sampling_rate / n as f64).collect()
}

/// Magnitude spectrum by direct DFT, O(N²).
///
/// The twiddle angle index is reduced as `(k * n) mod N`, so the phase
/// argument stays small for long inputs.
pub fn compute_spectrum(signal: &[f64], sampling_rate: f64) -> SpectralResult {
    let n = signal.len();
    let half = n / 2;
    if half == 0 {
        return SpectralResult::default();
    }

    let (cos_table, sin_table): (Vec<f64>, Vec<f64>) = (0..n)
        .map(|j| {
            let angle = 2.0 * PI * j as f64 / n as f64;
            (angle.cos(), angle.sin())
        })
        .unzip();

    let mut values = Vec::with_capacity(half);
    for k in 0..half {
        let mut real = 0.0;
        let mut imag = 0.0;
        let mut index = 0;
        for &x in signal {
            real += x * cos_table[index];
            imag -= x * sin_table[index];
            index += k;
            if index >= n {
                index -= n;
            }
        }
        values.push(2.0 * (real * real + imag * imag).sqrt() / n as f64);
    }

    SpectralResult {
        frequencies: frequency_axis(n, sampling_rate),
        values,
    }
}

/// dB power from an existing magnitude spectrum
pub fn psd_from_spectrum(spectrum: &SpectralResult) -> SpectralResult {
    SpectralResult {
        frequencies: spectrum.frequencies.clone(),
        values: spectrum
            .values
            .iter()
            .map(|m| 10.0 * (m * m + PSD_EPSILON).log10())
            .collect(),
    }
}

/// Power spectral density in dB: `10 log10(magnitude² + 1e-10)`
pub fn compute_psd(signal: &[f64], sampling_rate: f64) -> SpectralResult {
    psd_from_spectrum(&compute_spectrum(signal, sampling_rate))
}

/// Source of magnitude spectra
pub trait SpectralEstimator {
    fn spectrum(&self, signal: &[f64], sampling_rate: f64) -> SpectralResult;

    fn psd(&self, signal: &[f64], sampling_rate: f64) -> SpectralResult {
        psd_from_spectrum(&self.spectrum(signal, sampling_rate))
    }

    fn name(&self) -> &str;
}

/// Direct O(N²) transform
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectDft;

impl SpectralEstimator for DirectDft {
    fn spectrum(&self, signal: &[f64], sampling_rate: f64) -> SpectralResult {
        compute_spectrum(signal, sampling_rate)
    }

    fn name(&self) -> &str {
        "direct DFT"
    }
}

/// rustfft-backed transform with the same bins and scaling
#[derive(Debug, Clone, Copy, Default)]
pub struct FastFourier;

impl SpectralEstimator for FastFourier {
    fn spectrum(&self, signal: &[f64], sampling_rate: f64) -> SpectralResult {
        let n = signal.len();
        let half = n / 2;
        if half == 0 {
            return SpectralResult::default();
        }

        let mut buffer: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        SpectralResult {
            frequencies: frequency_axis(n, sampling_rate),
            values: buffer[..half]
                .iter()
                .map(|c| 2.0 * c.norm() / n as f64)
                .collect(),
        }
    }

    fn name(&self) -> &str {
        "FFT"
    }
}

/// Estimator selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrumMethod {
    #[default]
    Direct,
    Fast,
}

impl SpectrumMethod {
    pub fn estimator(&self) -> Box<dyn SpectralEstimator> {
        match self {
            SpectrumMethod::Direct => Box::new(DirectDft),
            SpectrumMethod::Fast => Box::new(FastFourier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, amplitude: f64, sampling_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / sampling_rate).sin())
            .collect()
    }

    #[test]
    fn test_frequency_axis() {
        let result = compute_spectrum(&[0.0; 8], 8.0);
        assert_eq!(result.frequencies, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(result.values.len(), 4);
    }

    #[test]
    fn test_short_input_is_empty() {
        assert!(compute_spectrum(&[], 100.0).is_empty());
        assert!(compute_spectrum(&[1.0], 100.0).is_empty());
        assert!(FastFourier.spectrum(&[1.0], 100.0).is_empty());
    }

    #[test]
    fn test_sine_peak_and_amplitude() {
        let signal = sine(10.0, 3.0, 256.0, 256);
        let result = compute_spectrum(&signal, 256.0);
        let (freq, magnitude) = result.peak().unwrap();
        assert!((freq - 10.0).abs() < 1e-9);
        assert!((magnitude - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_dc_doubling() {
        // Single-sided scaling doubles the DC bin as well
        let result = compute_spectrum(&[1.0; 16], 16.0);
        assert!((result.values[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fast_matches_direct() {
        let signal: Vec<f64> = (0..300)
            .map(|i| (i as f64 * 0.21).sin() * 2.0 + (i as f64 * 1.3).cos() * 0.5 + 0.1)
            .collect();
        let direct = DirectDft.spectrum(&signal, 100.0);
        let fast = FastFourier.spectrum(&signal, 100.0);
        assert_eq!(direct.frequencies, fast.frequencies);
        for (d, f) in direct.values.iter().zip(&fast.values) {
            assert!((d - f).abs() < 1e-9);
        }
    }

    #[test]
    fn test_psd_increases_with_amplitude() {
        let quiet = compute_psd(&sine(20.0, 1.0, 200.0, 400), 200.0);
        let loud = compute_psd(&sine(20.0, 4.0, 200.0, 400), 200.0);
        let quiet_peak = quiet.value_near(20.0).unwrap();
        let loud_peak = loud.value_near(20.0).unwrap();
        assert!(loud_peak > quiet_peak);
        // 4x amplitude is 16x power
        assert!((loud_peak - quiet_peak - 10.0 * 16f64.log10()).abs() < 1e-6);
    }

    #[test]
    fn test_psd_floor_on_silence() {
        let psd = compute_psd(&[0.0; 32], 32.0);
        assert!(psd.values.iter().all(|v| (v + 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_truncate_to() {
        let mut result = compute_spectrum(&[0.0; 20], 20.0);
        result.truncate_to(4.0);
        assert_eq!(result.frequencies, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(result.values.len(), 5);
    }

    #[test]
    fn test_value_near() {
        let result = SpectralResult {
            frequencies: vec![0.0, 1.0, 2.0],
            values: vec![5.0, 6.0, 7.0],
        };
        assert_eq!(result.value_near(1.4), Some(6.0));
        assert_eq!(result.value_near(10.0), Some(7.0));
        assert_eq!(SpectralResult::default().value_near(1.0), None);
    }

    #[test]
    fn test_method_selects_estimator() {
        assert_eq!(SpectrumMethod::Direct.estimator().name(), "direct DFT");
        assert_eq!(SpectrumMethod::Fast.estimator().name(), "FFT");
    }
}
