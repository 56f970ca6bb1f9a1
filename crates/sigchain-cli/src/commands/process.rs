use crate::cli::ProcessArgs;
use crate::commands::build_session;
use crate::data;
use anyhow::{Context, Result};
use sigchain_processing::CsvExport;
use std::fs;

pub fn execute(args: ProcessArgs) -> Result<()> {
    let session = build_session(&args.source)?;

    let processed = session.processed_or_empty()?;
    for warning in &processed.warnings {
        eprintln!("warning: {}", warning);
    }

    let channel = session.active_channel().unwrap_or("signal");
    let export = CsvExport::new(channel, processed.times, processed.values)?;
    let writer = data::output_writer(args.output.as_deref())?;
    export.write_to(writer).context("Failed to write processed CSV")?;

    if let Some(path) = &args.save_pipeline {
        let json = session.pipeline_document().to_json()?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write pipeline '{}'", path.display()))?;
    }
    Ok(())
}
