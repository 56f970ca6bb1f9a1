//! sigchain-processing: Filter chain engine for recorded biosignals
//!
//! Parameterized filter stages, the reorderable chain that folds them over a
//! channel, spectral estimation, pipeline documents and exports.

pub mod config;
pub mod export;
pub mod filters;
pub mod pipeline;
pub mod processor;
pub mod session;
pub mod spectrum;

pub use config::{EngineConfig, PipelineDocument, PipelinePreset, StageConfig};
pub use export::{CsvExport, ScriptGenerator};
pub use filters::{FilterKind, FilterStage, ALPHA_CAP};
pub use pipeline::{ChainEntry, ChainOutput, FilterChain, StageId, StageReport};
pub use processor::{apply_fail_open, ProcessingMetrics, SignalTransform, StageOutcome};
pub use session::{ProcessedSignal, Session, ViewState};
pub use spectrum::{
    compute_psd, compute_spectrum, psd_from_spectrum, DirectDft, FastFourier, SpectralEstimator,
    SpectralResult, SpectrumMethod, MAX_INTERACTIVE_DFT_SAMPLES,
};
