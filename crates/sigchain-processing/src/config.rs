//! Pipeline documents and engine configuration
//!
//! A [`PipelineDocument`] is the persisted form of a filter chain:
//!
//! ```json
//! { "pipeline": [ { "kind": "lowpass", "enabled": true,
//!                   "params": { "cutoff": 50, "order": 4 } } ],
//!   "samplingRate": 250 }
//! ```
//!
//! Stage ids are not persisted; loading a document assigns fresh ids.

use crate::filters::{FilterKind, FilterStage};
use crate::pipeline::{ChainEntry, FilterChain};
use crate::spectrum::{SpectrumMethod, MAX_INTERACTIVE_DFT_SAMPLES};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sigchain_core::{config_error, SigError, SigResult};
use std::collections::BTreeMap;
use tracing::info;

fn default_enabled() -> bool {
    true
}

/// Serialized form of one chain entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    /// Fields this version does not understand, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StageConfig {
    pub fn from_entry(entry: &ChainEntry) -> Self {
        Self {
            kind: entry.kind().as_str().to_string(),
            enabled: entry.enabled(),
            params: entry.stage().params(),
            extra: entry.extra().clone(),
        }
    }

    /// Typed stage described by this entry
    pub fn to_stage(&self) -> SigResult<FilterStage> {
        let kind: FilterKind = self.kind.parse()?;
        FilterStage::from_params(kind, &self.params)
    }
}

/// Persisted pipeline: stage list plus the sampling rate it was built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDocument {
    pub pipeline: Vec<StageConfig>,
    pub sampling_rate: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ready-made pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePreset {
    /// Detrend, 1-40 Hz band, 50 Hz notch
    EegCleanup,
    /// Running median followed by a short moving average
    SpikeRemoval,
    /// 50 Hz notch and its first harmonic when below Nyquist
    PowerlineRemoval,
}

impl PipelinePreset {
    pub const ALL: [PipelinePreset; 3] = [
        PipelinePreset::EegCleanup,
        PipelinePreset::SpikeRemoval,
        PipelinePreset::PowerlineRemoval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePreset::EegCleanup => "eeg-cleanup",
            PipelinePreset::SpikeRemoval => "spike-removal",
            PipelinePreset::PowerlineRemoval => "powerline-removal",
        }
    }

    fn stages(&self, sampling_rate: f64) -> Vec<FilterStage> {
        match self {
            PipelinePreset::EegCleanup => vec![
                FilterStage::Detrend,
                FilterStage::bandpass(1.0, 40.0, 4.0),
                FilterStage::notch(50.0, 30.0),
            ],
            PipelinePreset::SpikeRemoval => {
                vec![FilterStage::median(5.0), FilterStage::moving_average(5.0)]
            }
            PipelinePreset::PowerlineRemoval => {
                let mut stages = vec![FilterStage::notch(50.0, 30.0)];
                if 100.0 < sampling_rate / 2.0 {
                    stages.push(FilterStage::notch(100.0, 30.0));
                }
                stages
            }
        }
    }
}

impl std::str::FromStr for PipelinePreset {
    type Err = SigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelinePreset::ALL
            .iter()
            .copied()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| config_error!("Unknown preset '{}'", s))
    }
}

impl PipelineDocument {
    /// Snapshot a chain
    pub fn from_chain(chain: &FilterChain, sampling_rate: f64) -> Self {
        Self {
            pipeline: chain.entries().iter().map(StageConfig::from_entry).collect(),
            sampling_rate,
            extra: Map::new(),
        }
    }

    /// Document for a preset pipeline
    pub fn preset(preset: PipelinePreset, sampling_rate: f64) -> Self {
        let mut chain = FilterChain::new();
        for stage in preset.stages(sampling_rate) {
            chain.append_stage(stage);
        }
        Self::from_chain(&chain, sampling_rate)
    }

    /// Build a fresh chain. Unknown stage fields ride along on the entries
    /// and do not affect processing.
    pub fn to_chain(&self) -> SigResult<FilterChain> {
        let mut chain = FilterChain::new();
        for stage_config in &self.pipeline {
            let stage = stage_config.to_stage()?;
            let id = chain.append_stage(stage);
            if !stage_config.enabled {
                chain.set_enabled(id, false)?;
            }
            if !stage_config.extra.is_empty() {
                chain.set_extra(id, stage_config.extra.clone())?;
            }
        }
        Ok(chain)
    }

    /// Validate the sampling rate and every stage entry
    pub fn validate(&self) -> SigResult<()> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(config_error!(
                "Sampling rate {} must be positive",
                self.sampling_rate
            ));
        }
        for stage_config in &self.pipeline {
            stage_config.to_stage()?;
        }
        Ok(())
    }

    /// Export document as pretty-printed JSON
    pub fn to_json(&self) -> SigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SigError::SerializationError {
            message: format!("Failed to serialize pipeline: {}", e),
        })
    }

    pub fn to_json_compact(&self) -> SigResult<String> {
        serde_json::to_string(self).map_err(|e| SigError::SerializationError {
            message: format!("Failed to serialize pipeline: {}", e),
        })
    }

    /// Parse and validate a document
    pub fn from_json(json: &str) -> SigResult<Self> {
        let document: PipelineDocument = serde_json::from_str(json)
            .map_err(|e| config_error!("Failed to deserialize pipeline: {}", e))?;
        document.validate()?;
        info!(
            "Loaded pipeline document with {} stages at {} Hz",
            document.pipeline.len(),
            document.sampling_rate
        );
        Ok(document)
    }
}

/// Engine-wide settings for spectral views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper frequency shown in spectra; `None` shows up to Nyquist
    pub max_frequency: Option<f64>,
    pub spectrum_method: SpectrumMethod,
    /// Above this many samples the direct DFT logs a warning
    pub max_interactive_dft_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_frequency: None,
            spectrum_method: SpectrumMethod::Direct,
            max_interactive_dft_samples: MAX_INTERACTIVE_DFT_SAMPLES,
        }
    }
}

impl EngineConfig {
    /// Configuration for long recordings
    pub fn large_recordings() -> Self {
        Self {
            spectrum_method: SpectrumMethod::Fast,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SigResult<()> {
        if let Some(max_frequency) = self.max_frequency {
            if !(max_frequency.is_finite() && max_frequency > 0.0) {
                return Err(config_error!(
                    "Maximum frequency {} must be positive",
                    max_frequency
                ));
            }
        }
        if self.max_interactive_dft_samples == 0 {
            return Err(config_error!("DFT sample ceiling must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_json(&self) -> SigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SigError::SerializationError {
            message: format!("Failed to serialize engine configuration: {}", e),
        })
    }

    pub fn from_json(json: &str) -> SigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| config_error!("Failed to deserialize engine configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}
