//! Transform trait, per-stage metrics and the fail-open stage runner

use serde::{Deserialize, Serialize};
use sigchain_core::SigResult;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// A length-preserving transform over a sample sequence
pub trait SignalTransform {
    /// Transform `signal` sampled at `sampling_rate` Hz
    fn apply(&self, signal: &[f64], sampling_rate: f64) -> SigResult<Vec<f64>>;

    /// Transform name for reports and logs
    fn name(&self) -> &str;
}

/// Performance metrics for one stage application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Processing time in microseconds
    pub processing_time_us: u64,
    /// Number of input samples
    pub input_len: usize,
    /// False when the stage was bypassed
    pub success: bool,
    /// Reason for the bypass
    pub error_message: Option<String>,
}

impl ProcessingMetrics {
    pub fn new(input_len: usize) -> Self {
        Self {
            processing_time_us: 0,
            input_len,
            success: true,
            error_message: None,
        }
    }

    /// Start timing a processing operation
    pub fn start_timing(input_len: usize) -> ProcessingTimer {
        ProcessingTimer {
            start_time: Instant::now(),
            metrics: ProcessingMetrics::new(input_len),
        }
    }
}

/// Helper for timing processing operations
pub struct ProcessingTimer {
    start_time: Instant,
    metrics: ProcessingMetrics,
}

impl ProcessingTimer {
    /// Finish timing and return metrics
    pub fn finish(mut self) -> ProcessingMetrics {
        self.metrics.processing_time_us = self.start_time.elapsed().as_micros() as u64;
        self.metrics
    }

    /// Finish with error
    pub fn finish_with_error(mut self, error: &str) -> ProcessingMetrics {
        self.metrics.processing_time_us = self.start_time.elapsed().as_micros() as u64;
        self.metrics.success = false;
        self.metrics.error_message = Some(error.to_string());
        self.metrics
    }
}

/// Outcome of running a transform in fail-open mode
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Transform output, or a copy of the input when bypassed
    pub output: Vec<f64>,
    pub metrics: ProcessingMetrics,
}

impl StageOutcome {
    pub fn bypassed(&self) -> bool {
        !self.metrics.success
    }
}

/// Run `transform` so that any fault becomes a pass-through.
///
/// A fault is an `Err`, a panic, a length change, or a non-finite output
/// sample produced from finite input.
pub fn apply_fail_open<T>(transform: &T, input: &[f64], sampling_rate: f64) -> StageOutcome
where
    T: SignalTransform + ?Sized,
{
    let timer = ProcessingMetrics::start_timing(input.len());

    let fault = match catch_unwind(AssertUnwindSafe(|| transform.apply(input, sampling_rate))) {
        Ok(Ok(output)) => match check_output(input, &output) {
            None => {
                return StageOutcome {
                    output,
                    metrics: timer.finish(),
                }
            }
            Some(reason) => reason,
        },
        Ok(Err(e)) => e.to_string(),
        Err(panic) => format!("{} panicked: {}", transform.name(), panic_message(&*panic)),
    };

    StageOutcome {
        output: input.to_vec(),
        metrics: timer.finish_with_error(&fault),
    }
}

fn check_output(input: &[f64], output: &[f64]) -> Option<String> {
    if output.len() != input.len() {
        return Some(format!(
            "output length {} differs from input length {}",
            output.len(),
            input.len()
        ));
    }
    let input_finite = input.iter().all(|v| v.is_finite());
    if input_finite && output.iter().any(|v| !v.is_finite()) {
        return Some("non-finite output from finite input".to_string());
    }
    None
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
