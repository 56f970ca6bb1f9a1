use crate::cli::{MethodArg, SpectrumArgs};
use crate::commands::build_session;
use anyhow::Result;
use sigchain_processing::{EngineConfig, SpectrumMethod};
use std::io::Write;

pub fn execute(args: SpectrumArgs) -> Result<()> {
    let mut session = build_session(&args.source)?;
    session.set_engine_config(EngineConfig {
        max_frequency: args.max_frequency,
        spectrum_method: match args.method {
            MethodArg::Direct => SpectrumMethod::Direct,
            MethodArg::Fast => SpectrumMethod::Fast,
        },
        ..session.engine_config().clone()
    })?;

    let result = if args.psd {
        session.psd()?
    } else {
        session.spectrum()?
    };
    let column = if args.psd { "psd_db" } else { "magnitude" };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.peak {
        match result.peak() {
            Some((frequency, value)) => {
                if args.json {
                    let json = serde_json::json!({ "frequency": frequency, column: value });
                    writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
                } else {
                    writeln!(out, "frequency,{}", column)?;
                    writeln!(out, "{:.6},{:.6}", frequency, value)?;
                }
            }
            None => eprintln!("No samples in the selected range"),
        }
        return Ok(());
    }

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        writeln!(out, "frequency,{}", column)?;
        for (frequency, value) in result.iter() {
            writeln!(out, "{:.6},{:.6}", frequency, value)?;
        }
    }
    Ok(())
}
