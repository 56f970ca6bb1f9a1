//! Clean waveform shapes for demo channels

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Deterministic waveform of one demo channel, before noise and artifacts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// Steady sinusoid, e.g. an alpha rhythm
    Sine { frequency: f64, amplitude: f64 },
    /// Carrier switched on and off, like EMG contractions
    Burst {
        carrier: f64,
        amplitude: f64,
        on_duration: f64,
        off_duration: f64,
    },
    /// Linear frequency sweep over `duration` seconds, then held
    Chirp {
        start_frequency: f64,
        end_frequency: f64,
        amplitude: f64,
        duration: f64,
    },
    /// Sinusoid whose amplitude decays exponentially
    Fatigue {
        frequency: f64,
        initial_amplitude: f64,
        decay_rate: f64,
    },
}

impl SignalPattern {
    /// Waveform value at `time` seconds
    pub fn value_at(&self, time: f64) -> f64 {
        match *self {
            SignalPattern::Sine { frequency, amplitude } => {
                amplitude * (2.0 * PI * frequency * time).sin()
            }

            SignalPattern::Burst {
                carrier,
                amplitude,
                on_duration,
                off_duration,
            } => {
                let cycle = on_duration + off_duration;
                if cycle <= 0.0 || time.rem_euclid(cycle) >= on_duration {
                    0.0
                } else {
                    amplitude * (2.0 * PI * carrier * time).sin()
                }
            }

            SignalPattern::Chirp {
                start_frequency,
                end_frequency,
                amplitude,
                duration,
            } => {
                // Phase is the integral of the instantaneous frequency
                let sweep_time = time.min(duration).max(0.0);
                let rate = if duration > 0.0 {
                    (end_frequency - start_frequency) / duration
                } else {
                    0.0
                };
                let mut phase = start_frequency * sweep_time + 0.5 * rate * sweep_time * sweep_time;
                if time > duration {
                    phase += end_frequency * (time - duration);
                }
                amplitude * (2.0 * PI * phase).sin()
            }

            SignalPattern::Fatigue {
                frequency,
                initial_amplitude,
                decay_rate,
            } => initial_amplitude * (-decay_rate * time).exp() * (2.0 * PI * frequency * time).sin(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Sine { .. } => "Steady oscillation",
            SignalPattern::Burst { .. } => "Burst pattern",
            SignalPattern::Chirp { .. } => "Frequency sweep",
            SignalPattern::Fatigue { .. } => "Decaying oscillation",
        }
    }

    /// Named patterns for the demo generator
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("alpha", SignalPattern::Sine {
                frequency: 10.0,
                amplitude: 1.0,
            }),
            ("emg_bursts", SignalPattern::Burst {
                carrier: 80.0,
                amplitude: 2.0,
                on_duration: 1.0,
                off_duration: 1.0,
            }),
            ("sweep", SignalPattern::Chirp {
                start_frequency: 1.0,
                end_frequency: 40.0,
                amplitude: 1.0,
                duration: 10.0,
            }),
            ("fatigue", SignalPattern::Fatigue {
                frequency: 20.0,
                initial_amplitude: 1.5,
                decay_rate: 0.1,
            }),
        ]
    }

    pub fn preset(name: &str) -> Option<SignalPattern> {
        Self::presets()
            .into_iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, pattern)| pattern)
    }
}
