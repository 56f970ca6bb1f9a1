//! Session: single owner of the loaded dataset, the chain and the view
//!
//! Every read (`processed`, `spectrum`, exports) recomputes from the raw
//! buffer. Nothing is cached.

use crate::config::{EngineConfig, PipelineDocument, PipelinePreset};
use crate::export::{CsvExport, ScriptGenerator};
use crate::pipeline::FilterChain;
use crate::spectrum::{psd_from_spectrum, SpectralResult};
use serde_json::{Map, Value};
use sigchain_core::{config_error, Dataset, IndexWindow, SampleBuffer, SigResult, TimeRange};
use tracing::{debug, info, warn};

/// Raw and processed values over the same timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedSignal {
    pub times: Vec<f64>,
    pub raw: Vec<f64>,
    pub values: Vec<f64>,
    /// Stages that failed open during this run
    pub warnings: Vec<String>,
}

impl ProcessedSignal {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples inside a fractional view window
    pub fn visible(&self, window: &IndexWindow) -> ProcessedSignal {
        let range = window.index_range(self.len());
        ProcessedSignal {
            times: self.times[range.clone()].to_vec(),
            raw: self.raw[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Plot view settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Time window fed to the chain; `None` processes the whole channel
    pub time_range: Option<TimeRange>,
    /// Pan/zoom over the processed series
    pub index_window: IndexWindow,
}

#[derive(Debug, Clone)]
pub struct Session {
    dataset: Option<Dataset>,
    active_channel: Option<String>,
    chain: FilterChain,
    view: ViewState,
    sampling_rate: f64,
    engine: EngineConfig,
    /// Document-level fields of the last loaded pipeline
    document_extra: Map<String, Value>,
}

fn check_sampling_rate(sampling_rate: f64) -> SigResult<()> {
    if sampling_rate.is_finite() && sampling_rate > 0.0 {
        Ok(())
    } else {
        Err(config_error!("Sampling rate {} must be positive", sampling_rate))
    }
}

impl Session {
    pub fn new(sampling_rate: f64) -> SigResult<Self> {
        Self::with_engine_config(sampling_rate, EngineConfig::default())
    }

    pub fn with_engine_config(sampling_rate: f64, engine: EngineConfig) -> SigResult<Self> {
        check_sampling_rate(sampling_rate)?;
        engine.validate()?;
        Ok(Self {
            dataset: None,
            active_channel: None,
            chain: FilterChain::new(),
            view: ViewState::default(),
            sampling_rate,
            engine,
            document_extra: Map::new(),
        })
    }

    /// Replace the dataset; the first channel becomes active and the view
    /// is reset. The chain is kept.
    pub fn load_dataset(&mut self, dataset: Dataset) {
        info!(
            "Loaded dataset {} with {} channels",
            dataset.id,
            dataset.channel_count()
        );
        self.active_channel = dataset.channel_names().first().map(|s| s.to_string());
        self.dataset = Some(dataset);
        self.view = ViewState::default();
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn active_channel(&self) -> Option<&str> {
        self.active_channel.as_deref()
    }

    pub fn set_active_channel(&mut self, name: &str) -> SigResult<()> {
        self.loaded()?.channel(name)?;
        self.active_channel = Some(name.to_string());
        Ok(())
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut FilterChain {
        &mut self.chain
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn index_window_mut(&mut self) -> &mut IndexWindow {
        &mut self.view.index_window
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn set_sampling_rate(&mut self, sampling_rate: f64) -> SigResult<()> {
        check_sampling_rate(sampling_rate)?;
        self.sampling_rate = sampling_rate;
        Ok(())
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn set_engine_config(&mut self, engine: EngineConfig) -> SigResult<()> {
        engine.validate()?;
        self.engine = engine;
        Ok(())
    }

    /// Set or clear the time window
    pub fn set_time_range(&mut self, range: Option<TimeRange>) -> SigResult<()> {
        if let Some(range) = range {
            range.validate()?;
        }
        self.view.time_range = range;
        Ok(())
    }

    pub fn set_max_frequency(&mut self, max_frequency: Option<f64>) -> SigResult<()> {
        let engine = EngineConfig {
            max_frequency,
            ..self.engine.clone()
        };
        self.set_engine_config(engine)
    }

    fn loaded(&self) -> SigResult<&Dataset> {
        self.dataset
            .as_ref()
            .ok_or_else(|| config_error!("No dataset loaded"))
    }

    fn active_buffer(&self) -> SigResult<SampleBuffer> {
        let dataset = self.loaded()?;
        let name = self
            .active_channel
            .as_deref()
            .ok_or_else(|| config_error!("No active channel"))?;
        let buffer = &dataset.channel(name)?.buffer;
        match self.view.time_range {
            Some(range) => buffer.window(range),
            None => Ok(buffer.clone()),
        }
    }

    /// Active channel, windowed and run through the chain
    pub fn processed(&self) -> SigResult<ProcessedSignal> {
        let buffer = self.active_buffer()?;
        let report = self.chain.apply_with_report(buffer.values(), self.sampling_rate);
        debug!(
            "Chain of {} enabled stages ran in {}μs",
            report.stage_reports.len(),
            report.total_time_us
        );

        Ok(ProcessedSignal {
            times: buffer.times().to_vec(),
            raw: buffer.values().to_vec(),
            values: report.output,
            warnings: report.warnings,
        })
    }

    /// Like [`Session::processed`], with a range miss read as empty
    pub fn processed_or_empty(&self) -> SigResult<ProcessedSignal> {
        match self.processed() {
            Err(e) if e.is_range_miss() => {
                debug!("{}; showing empty series", e);
                Ok(ProcessedSignal::default())
            }
            other => other,
        }
    }

    /// Processed series restricted to the pan/zoom window
    pub fn visible(&self) -> SigResult<ProcessedSignal> {
        Ok(self.processed_or_empty()?.visible(&self.view.index_window))
    }

    /// Magnitude spectrum of the processed series
    pub fn spectrum(&self) -> SigResult<SpectralResult> {
        let processed = self.processed_or_empty()?;
        if processed.len() > self.engine.max_interactive_dft_samples {
            warn!(
                "Spectrum over {} samples exceeds the interactive ceiling of {}",
                processed.len(),
                self.engine.max_interactive_dft_samples
            );
        }

        let estimator = self.engine.spectrum_method.estimator();
        let mut spectrum = estimator.spectrum(&processed.values, self.sampling_rate);
        if let Some(max_frequency) = self.engine.max_frequency {
            spectrum.truncate_to(max_frequency);
        }
        Ok(spectrum)
    }

    /// dB power spectral density of the processed series
    pub fn psd(&self) -> SigResult<SpectralResult> {
        Ok(psd_from_spectrum(&self.spectrum()?))
    }

    pub fn export_csv(&self) -> SigResult<CsvExport> {
        let channel = self
            .active_channel
            .clone()
            .ok_or_else(|| config_error!("No active channel"))?;
        let processed = self.processed_or_empty()?;
        CsvExport::new(channel, processed.times, processed.values)
    }

    pub fn export_script(&self) -> SigResult<String> {
        let channel = self.active_channel.as_deref().unwrap_or("signal");
        Ok(ScriptGenerator::new(channel, self.sampling_rate).generate(&self.chain))
    }

    /// Current chain as a document, with the unknown fields of the last
    /// loaded document written back
    pub fn pipeline_document(&self) -> PipelineDocument {
        let mut document = PipelineDocument::from_chain(&self.chain, self.sampling_rate);
        document.extra = self.document_extra.clone();
        document
    }

    /// Replace chain and sampling rate from a document. On error the
    /// session is unchanged.
    pub fn load_pipeline_document(&mut self, document: &PipelineDocument) -> SigResult<()> {
        document.validate()?;
        let chain = document.to_chain()?;
        info!(
            "Pipeline replaced: {} stages at {} Hz",
            chain.len(),
            document.sampling_rate
        );
        self.chain = chain;
        self.sampling_rate = document.sampling_rate;
        self.document_extra = document.extra.clone();
        Ok(())
    }

    pub fn load_pipeline_json(&mut self, json: &str) -> SigResult<()> {
        let document = PipelineDocument::from_json(json)?;
        self.load_pipeline_document(&document)
    }

    pub fn apply_preset(&mut self, preset: PipelinePreset) -> SigResult<()> {
        self.load_pipeline_document(&PipelineDocument::preset(preset, self.sampling_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterKind;
    use sigchain_core::SigError;

    fn session_with_ramp() -> Session {
        let times: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let dataset = Dataset::from_columns(
            &times,
            vec![("ramp", values.clone()), ("double", values.iter().map(|v| v * 2.0).collect())],
        )
        .unwrap();
        let mut session = Session::new(100.0).unwrap();
        session.load_dataset(dataset);
        session
    }

    #[test]
    fn test_rejects_bad_sampling_rate() {
        assert!(Session::new(0.0).is_err());
        assert!(Session::new(f64::NAN).is_err());
    }

    #[test]
    fn test_first_channel_active() {
        let session = session_with_ramp();
        assert_eq!(session.active_channel(), Some("ramp"));
    }

    #[test]
    fn test_set_active_channel() {
        let mut session = session_with_ramp();
        session.set_active_channel("double").unwrap();
        assert_eq!(session.processed().unwrap().raw[10], 20.0);
        assert!(matches!(
            session.set_active_channel("missing"),
            Err(SigError::ChannelNotFound { .. })
        ));
        assert_eq!(session.active_channel(), Some("double"));
    }

    #[test]
    fn test_no_dataset() {
        let session = Session::new(100.0).unwrap();
        assert!(session.processed().unwrap_err().is_configuration());
    }

    #[test]
    fn test_time_window_feeds_chain() {
        let mut session = session_with_ramp();
        session.set_time_range(Some(TimeRange::new(0.2, 0.3))).unwrap();
        session.chain_mut().append(FilterKind::Normalize);

        let processed = session.processed().unwrap();
        assert_eq!(processed.len(), 10);
        assert_eq!(processed.raw[0], 20.0);
        assert_eq!(processed.values[0], 0.0);
        assert_eq!(processed.values[9], 1.0);
    }

    #[test]
    fn test_range_miss_is_empty() {
        let mut session = session_with_ramp();
        session.set_time_range(Some(TimeRange::new(50.0, 60.0))).unwrap();
        assert!(session.processed().unwrap_err().is_range_miss());
        assert!(session.processed_or_empty().unwrap().is_empty());
        assert!(session.spectrum().unwrap().is_empty());
    }

    #[test]
    fn test_visible_window() {
        let mut session = session_with_ramp();
        *session.index_window_mut() = IndexWindow::new(0.5, 1.0).unwrap();
        let visible = session.visible().unwrap();
        assert_eq!(visible.len(), 50);
        assert_eq!(visible.raw[0], 50.0);
    }

    #[test]
    fn test_spectrum_truncated_to_max_frequency() {
        let mut session = session_with_ramp();
        session.set_max_frequency(Some(10.0)).unwrap();
        let spectrum = session.spectrum().unwrap();
        assert!(spectrum.frequencies.iter().all(|&f| f <= 10.0));
        assert_eq!(spectrum.len(), 11);
        assert!(session.set_max_frequency(Some(-3.0)).is_err());
    }

    #[test]
    fn test_load_pipeline_is_atomic() {
        let mut session = session_with_ramp();
        session.chain_mut().append(FilterKind::Detrend);
        let before = session.pipeline_document();

        let bad = r#"{ "pipeline": [ { "kind": "detrend", "params": {} },
                                     { "kind": "nonsense", "params": {} } ],
                       "samplingRate": 500 }"#;
        assert!(session.load_pipeline_json(bad).is_err());
        assert_eq!(session.pipeline_document(), before);
        assert_eq!(session.sampling_rate(), 100.0);

        session.apply_preset(PipelinePreset::SpikeRemoval).unwrap();
        assert_eq!(session.chain().len(), 2);
    }

    #[test]
    fn test_load_then_save_keeps_unknown_fields() {
        let mut session = session_with_ramp();
        let json = r#"{"pipeline":[{"kind":"detrend","params":{},"label":"x"}],"samplingRate":100,"author":"me"}"#;
        session.load_pipeline_json(json).unwrap();

        let saved = session.pipeline_document();
        assert_eq!(saved.extra.get("author"), Some(&Value::from("me")));
        assert_eq!(saved.pipeline[0].extra.get("label"), Some(&Value::from("x")));
        assert_eq!(saved, PipelineDocument::from_json(json).unwrap());

        // Survives edits to the chain
        session.chain_mut().append(FilterKind::Median);
        let saved = session.pipeline_document();
        assert_eq!(saved.extra.get("author"), Some(&Value::from("me")));
        assert_eq!(saved.pipeline.len(), 2);
        assert!(saved.pipeline[1].extra.is_empty());
    }

    #[test]
    fn test_exports() {
        let mut session = session_with_ramp();
        session.chain_mut().append(FilterKind::Median);
        let csv = session.export_csv().unwrap();
        assert_eq!(csv.channel, "ramp");
        assert_eq!(csv.len(), 100);
        assert!(session.export_script().unwrap().contains("signal.medfilt(data, 5)"));
    }
}
