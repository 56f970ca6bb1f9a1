//! Error handling for the sigchain engine
//!
//! One error enum shared by every crate in the workspace. Configuration
//! errors are rejected at the boundary before any computation runs; stage
//! faults (`ProcessingError`) are converted into pass-through by the filter
//! chain and never reach the caller of `apply`.

use thiserror::Error;

/// Result type alias for sigchain operations
pub type SigResult<T> = Result<T, SigError>;

/// Error type for all sigchain operations
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SigError {
    /// Sample data violates a buffer or dataset invariant
    #[error("Invalid signal data: {reason}")]
    InvalidSignalData { reason: String },

    /// Requested channel does not exist in the dataset
    #[error("Channel '{name}' not found")]
    ChannelNotFound { name: String },

    /// Generic configuration problem (pipeline document, engine config)
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Filter kind name not recognised
    #[error("Unknown filter kind '{kind}'")]
    UnknownFilterKind { kind: String },

    /// Parameter name not declared for the stage kind
    #[error("Parameter '{name}' is not declared for filter kind '{kind}'")]
    UnknownParameter { kind: String, name: String },

    /// Declared parameter absent from a serialized stage
    #[error("Filter kind '{kind}' requires parameter '{name}'")]
    MissingParameter { kind: String, name: String },

    /// Parameter value is not usable (NaN, infinite)
    #[error("Invalid value {value} for parameter '{name}'")]
    InvalidParameterValue { name: String, value: f64 },

    /// No stage with the given id in the chain
    #[error("Stage {id} not found in chain")]
    StageNotFound { id: String },

    /// Reorder request is not a permutation of the chain's ids
    #[error("Invalid reorder: {reason}")]
    InvalidReorder { reason: String },

    /// No sample at or after the requested start time
    #[error("No samples in time range [{start:.3}, {end:.3}]")]
    RangeNotFound { start: f64, end: f64 },

    /// Malformed window bounds
    #[error("Invalid window: {reason}")]
    InvalidWindow { reason: String },

    /// Local fault while applying a stage
    #[error("Processing error: {message}")]
    ProcessingError { message: String },

    /// JSON encode/decode failure
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl SigError {
    /// True for errors that reject a configuration change
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SigError::ConfigurationError { .. }
                | SigError::UnknownFilterKind { .. }
                | SigError::UnknownParameter { .. }
                | SigError::MissingParameter { .. }
                | SigError::InvalidParameterValue { .. }
                | SigError::StageNotFound { .. }
                | SigError::InvalidReorder { .. }
                | SigError::SerializationError { .. }
        )
    }

    /// True for range lookup misses, which callers treat as empty results
    pub fn is_range_miss(&self) -> bool {
        matches!(self, SigError::RangeNotFound { .. })
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::SigError::ConfigurationError {
            message: format!($($arg)*),
        }
    };
}

/// Convenience macro for creating processing errors
#[macro_export]
macro_rules! processing_error {
    ($($arg:tt)*) => {
        $crate::error::SigError::ProcessingError {
            message: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SigError::UnknownParameter {
            kind: "lowpass".to_string(),
            name: "quality".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("quality"));
        assert!(display.contains("lowpass"));
    }

    #[test]
    fn test_error_classes() {
        assert!(config_error!("bad {}", 1).is_configuration());
        assert!(!processing_error!("boom").is_configuration());
        assert!(SigError::RangeNotFound { start: 1.0, end: 2.0 }.is_range_miss());
    }

    #[test]
    fn test_macro_formats_message() {
        let error = config_error!("sampling rate {} must be positive", -1.0);
        assert_eq!(
            error,
            SigError::ConfigurationError {
                message: "sampling rate -1 must be positive".to_string()
            }
        );
    }
}
