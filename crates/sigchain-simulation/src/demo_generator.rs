//! Seeded multi-channel demo recordings
//!
//! Each channel is a clean [`SignalPattern`] plus the contaminants the
//! filter chain is meant to remove: linear drift, slow baseline wander,
//! Gaussian noise, powerline interference and sparse spikes.

use crate::signal_patterns::SignalPattern;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use sigchain_core::{config_error, Dataset, SigResult};
use std::f64::consts::PI;
use tracing::info;

/// Noise and artifact configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Amplitude of the 0.1 Hz baseline wander
    pub baseline_wander: f64,
    /// Linear drift in units per second
    pub drift_per_second: f64,
    /// Per-sample probability of an isolated spike
    pub spike_probability: f64,
    pub spike_amplitude: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.1,
            baseline_wander: 0.3,
            drift_per_second: 0.05,
            spike_probability: 0.002,
            spike_amplitude: 8.0,
        }
    }
}

impl NoiseConfig {
    /// No contaminants at all
    pub fn clean() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            drift_per_second: 0.0,
            spike_probability: 0.0,
            spike_amplitude: 0.0,
        }
    }
}

/// One generated channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    pub pattern: SignalPattern,
}

/// Configuration for demo generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Recording length in seconds
    pub duration: f64,
    pub channels: Vec<ChannelSpec>,
    pub noise: NoiseConfig,
    /// Power line interference (50/60Hz)
    pub powerline_freq: Option<f64>,
    pub powerline_amplitude: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 250.0,
            duration: 10.0,
            channels: SignalPattern::presets()
                .into_iter()
                .map(|(name, pattern)| ChannelSpec {
                    name: name.to_string(),
                    pattern,
                })
                .collect(),
            noise: NoiseConfig::default(),
            powerline_freq: Some(50.0),
            powerline_amplitude: 0.5,
            seed: None,
        }
    }
}

impl DemoConfig {
    pub fn validate(&self) -> SigResult<()> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(config_error!(
                "Sampling rate {} must be positive",
                self.sampling_rate
            ));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(config_error!("Duration {} must be positive", self.duration));
        }
        if self.channels.is_empty() {
            return Err(config_error!("At least one channel is required"));
        }
        if !(0.0..=1.0).contains(&self.noise.spike_probability) {
            return Err(config_error!(
                "Spike probability {} must lie in [0, 1]",
                self.noise.spike_probability
            ));
        }
        if !(self.noise.gaussian_std.is_finite() && self.noise.gaussian_std >= 0.0) {
            return Err(config_error!(
                "Noise standard deviation {} must be finite and non-negative",
                self.noise.gaussian_std
            ));
        }
        let amplitudes = [
            ("Baseline wander", self.noise.baseline_wander),
            ("Drift", self.noise.drift_per_second),
            ("Spike amplitude", self.noise.spike_amplitude),
            ("Powerline amplitude", self.powerline_amplitude),
        ];
        for (name, value) in amplitudes {
            if !value.is_finite() {
                return Err(config_error!("{} {} must be finite", name, value));
            }
        }
        if let Some(frequency) = self.powerline_freq {
            if !(frequency.is_finite() && frequency > 0.0) {
                return Err(config_error!(
                    "Powerline frequency {} must be positive",
                    frequency
                ));
            }
        }
        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        (self.duration * self.sampling_rate) as usize
    }
}

/// Demo recording generator
pub struct DemoGenerator {
    config: DemoConfig,
    rng: StdRng,
    normal_dist: Normal<f64>,
}

impl DemoGenerator {
    pub fn new(config: DemoConfig) -> SigResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        let rng = StdRng::seed_from_u64(seed);
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std)
            .map_err(|e| config_error!("Failed to create normal distribution: {}", e))?;

        Ok(DemoGenerator {
            config,
            rng,
            normal_dist,
        })
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// Generate a dataset with one column per configured channel
    pub fn generate(&mut self) -> SigResult<Dataset> {
        let n = self.config.sample_count();
        let dt = 1.0 / self.config.sampling_rate;
        let times: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();

        let specs = self.config.channels.clone();
        let columns = specs
            .iter()
            .map(|spec| {
                let values = times
                    .iter()
                    .map(|&t| spec.pattern.value_at(t) + self.contamination(t))
                    .collect();
                (spec.name.clone(), values)
            })
            .collect::<Vec<(String, Vec<f64>)>>();

        let dataset = Dataset::from_columns(&times, columns)?;
        info!(
            "Generated demo dataset: {} channels x {} samples at {} Hz",
            dataset.channel_count(),
            n,
            self.config.sampling_rate
        );
        Ok(dataset)
    }

    fn contamination(&mut self, time: f64) -> f64 {
        let noise = &self.config.noise;
        let mut value = self.normal_dist.sample(&mut self.rng);

        value += noise.drift_per_second * time;
        value += noise.baseline_wander * (2.0 * PI * 0.1 * time).sin();

        if let Some(frequency) = self.config.powerline_freq {
            value += self.config.powerline_amplitude * (2.0 * PI * frequency * time).sin();
        }

        if noise.spike_probability > 0.0 && self.rng.gen::<f64>() < noise.spike_probability {
            let sign = if self.rng.gen::<bool>() { 1.0 } else { -1.0 };
            value += sign * noise.spike_amplitude;
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> DemoConfig {
        DemoConfig {
            seed: Some(seed),
            ..DemoConfig::default()
        }
    }

    #[test]
    fn test_default_shape() {
        let dataset = DemoGenerator::new(seeded(1)).unwrap().generate().unwrap();
        assert_eq!(dataset.channel_count(), 4);
        assert_eq!(dataset.channel_names(), vec!["alpha", "emg_bursts", "sweep", "fatigue"]);
        for channel in dataset.channels() {
            assert_eq!(channel.buffer.len(), 2500);
        }
        let rate = dataset.estimated_sampling_rate().unwrap();
        assert!((rate - 250.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = DemoGenerator::new(seeded(7)).unwrap().generate().unwrap();
        let b = DemoGenerator::new(seeded(7)).unwrap().generate().unwrap();
        let c = DemoGenerator::new(seeded(8)).unwrap().generate().unwrap();
        assert_eq!(a.channels(), b.channels());
        assert_ne!(a.channels(), c.channels());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_clean_config_matches_pattern() {
        let pattern = SignalPattern::Sine {
            frequency: 5.0,
            amplitude: 2.0,
        };
        let config = DemoConfig {
            sampling_rate: 100.0,
            duration: 1.0,
            channels: vec![ChannelSpec {
                name: "sine".to_string(),
                pattern,
            }],
            noise: NoiseConfig::clean(),
            powerline_freq: None,
            powerline_amplitude: 0.0,
            seed: Some(3),
        };
        let dataset = DemoGenerator::new(config).unwrap().generate().unwrap();
        let buffer = &dataset.channel("sine").unwrap().buffer;
        for (t, v) in buffer.iter() {
            assert!((v - pattern.value_at(t)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spikes_present_when_enabled() {
        let mut config = seeded(11);
        config.noise.spike_probability = 0.01;
        config.noise.gaussian_std = 0.0;
        let dataset = DemoGenerator::new(config).unwrap().generate().unwrap();
        let stats = dataset.channel("alpha").unwrap().buffer.stats();
        assert!(stats.max > 6.0 || stats.min < -6.0);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = seeded(1);
        config.sampling_rate = 0.0;
        assert!(DemoGenerator::new(config).is_err());

        let mut config = seeded(1);
        config.channels.clear();
        assert!(DemoGenerator::new(config).is_err());

        let mut config = seeded(1);
        config.noise.gaussian_std = -1.0;
        assert!(DemoGenerator::new(config).is_err());

        let mut config = seeded(1);
        config.noise.gaussian_std = f64::NAN;
        assert!(DemoGenerator::new(config).is_err());
    }

    #[test]
    fn test_non_finite_artifacts_rejected() {
        let mut config = seeded(1);
        config.noise.spike_amplitude = f64::INFINITY;
        assert!(config.validate().unwrap_err().is_configuration());

        let mut config = seeded(1);
        config.powerline_amplitude = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = seeded(1);
        config.powerline_freq = Some(f64::NAN);
        assert!(config.validate().is_err());

        let mut config = seeded(1);
        config.powerline_freq = Some(-50.0);
        assert!(config.validate().is_err());

        let mut config = seeded(1);
        config.powerline_freq = None;
        config.noise.gaussian_std = 0.0;
        assert!(config.validate().is_ok());
    }
}
