pub mod demo;
pub mod kinds;
pub mod process;
pub mod script;
pub mod spectrum;

use crate::cli::{PipelineArgs, SourceArgs};
use crate::data;
use anyhow::{bail, Context, Result};
use sigchain_core::TimeRange;
use sigchain_processing::{PipelineDocument, PipelinePreset, Session};
use std::fs;

/// Pipeline document named by `--pipeline` or `--preset`, if any
pub fn load_document(args: &PipelineArgs, sampling_rate: f64) -> Result<Option<PipelineDocument>> {
    if let Some(path) = &args.pipeline {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline '{}'", path.display()))?;
        let document = PipelineDocument::from_json(&json)
            .with_context(|| format!("Invalid pipeline '{}'", path.display()))?;
        return Ok(Some(document));
    }
    if let Some(name) = &args.preset {
        let preset: PipelinePreset = name.parse()?;
        return Ok(Some(PipelineDocument::preset(preset, sampling_rate)));
    }
    Ok(None)
}

/// Session with the input loaded, channel selected, pipeline applied and
/// time window set
pub fn build_session(args: &SourceArgs) -> Result<Session> {
    let dataset = data::load_csv(&args.input)?;

    let estimated = dataset.estimated_sampling_rate();
    let document = load_document(&args.pipeline, args.rate.or(estimated).unwrap_or(1.0))?;
    let sampling_rate = match (args.rate, &document, estimated) {
        (Some(rate), _, _) => rate,
        (None, Some(document), _) if args.pipeline.pipeline.is_some() => document.sampling_rate,
        (None, _, Some(rate)) => rate,
        _ => bail!("Cannot determine the sampling rate; pass --rate"),
    };

    let mut session = Session::new(sampling_rate)?;
    session.load_dataset(dataset);
    if let Some(channel) = &args.channel {
        session.set_active_channel(channel)?;
    }
    if let Some(document) = &document {
        session.load_pipeline_document(document)?;
        // An explicit --rate wins over the document's rate
        session.set_sampling_rate(sampling_rate)?;
    }
    if let (Some(start), Some(end)) = (args.start, args.end) {
        session.set_time_range(Some(TimeRange::new(start, end)))?;
    }

    tracing::info!(
        "Processing '{}' at {} Hz through {} stages",
        session.active_channel().unwrap_or("-"),
        session.sampling_rate(),
        session.chain().enabled_count()
    );
    Ok(session)
}
