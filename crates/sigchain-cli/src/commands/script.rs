use crate::cli::ScriptArgs;
use crate::commands::load_document;
use anyhow::Result;
use sigchain_processing::{FilterChain, ScriptGenerator};

const FALLBACK_RATE: f64 = 250.0;

pub fn execute(args: ScriptArgs) -> Result<()> {
    let document = load_document(&args.pipeline, args.rate.unwrap_or(FALLBACK_RATE))?;

    let (chain, sampling_rate) = match &document {
        Some(document) => (
            document.to_chain()?,
            args.rate.unwrap_or(document.sampling_rate),
        ),
        None => (FilterChain::new(), args.rate.unwrap_or(FALLBACK_RATE)),
    };

    let script = ScriptGenerator::new(args.channel, sampling_rate)
        .with_paths(args.data_path, args.output_path)
        .generate(&chain);
    print!("{}", script);
    Ok(())
}
