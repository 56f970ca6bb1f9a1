//! sigchain-simulation: Demo recording generation
//!
//! Reproducible multi-channel recordings with the usual biosignal
//! contaminants, for exercising the filter chain without real data.

pub mod demo_generator;
pub mod signal_patterns;

pub use demo_generator::{ChannelSpec, DemoConfig, DemoGenerator, NoiseConfig};
pub use signal_patterns::SignalPattern;
