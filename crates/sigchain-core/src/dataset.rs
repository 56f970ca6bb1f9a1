//! Loaded recordings: named channels sharing one acquisition

use crate::error::{SigError, SigResult};
use crate::sample_buffer::SampleBuffer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One named channel of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub buffer: SampleBuffer,
}

impl Channel {
    pub fn new(name: impl Into<String>, buffer: SampleBuffer) -> Self {
        Self {
            name: name.into(),
            buffer,
        }
    }

    /// Build a channel from a shared time column, dropping rows where either
    /// the time or the value is not finite
    pub fn from_column(name: impl Into<String>, times: &[f64], values: &[f64]) -> SigResult<Self> {
        let name = name.into();
        if times.len() != values.len() {
            return Err(SigError::InvalidSignalData {
                reason: format!(
                    "Channel '{}' has {} values for {} time points",
                    name,
                    values.len(),
                    times.len()
                ),
            });
        }

        let buffer = SampleBuffer::from_pairs(
            times
                .iter()
                .zip(values)
                .filter(|(t, v)| t.is_finite() && v.is_finite())
                .map(|(&t, &v)| (t, v)),
        )?;

        Ok(Self { name, buffer })
    }
}

/// A loaded multi-channel recording
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Unique identifier for this load
    pub id: Uuid,
    /// Load timestamp (ms since the Unix epoch)
    pub loaded_at: u64,
    channels: Vec<Channel>,
}

impl Dataset {
    /// Create dataset from channels; names must be unique
    pub fn new(channels: Vec<Channel>) -> SigResult<Self> {
        let mut seen = HashSet::new();
        for channel in &channels {
            if !seen.insert(channel.name.as_str()) {
                return Err(SigError::InvalidSignalData {
                    reason: format!("Duplicate channel name '{}'", channel.name),
                });
            }
        }

        Ok(Dataset {
            id: Uuid::new_v4(),
            loaded_at: now_millis(),
            channels,
        })
    }

    /// Create dataset from a time column and named value columns
    pub fn from_columns<S>(times: &[f64], columns: Vec<(S, Vec<f64>)>) -> SigResult<Self>
    where
        S: Into<String>,
    {
        let channels = columns
            .into_iter()
            .map(|(name, values)| Channel::from_column(name, times, &values))
            .collect::<SigResult<Vec<_>>>()?;
        Self::new(channels)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn channel(&self, name: &str) -> SigResult<&Channel> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SigError::ChannelNotFound {
                name: name.to_string(),
            })
    }

    /// Sampling rate estimated from the first non-trivial channel
    pub fn estimated_sampling_rate(&self) -> Option<f64> {
        self.channels
            .iter()
            .find_map(|c| c.buffer.estimated_sampling_rate())
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
