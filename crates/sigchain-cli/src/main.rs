//! sigchain command-line front end

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod data;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match cli.command {
        Command::Demo(args) => commands::demo::execute(args),
        Command::Process(args) => commands::process::execute(args),
        Command::Spectrum(args) => commands::spectrum::execute(args),
        Command::Script(args) => commands::script::execute(args),
        Command::Kinds(args) => commands::kinds::execute(args),
    }
}
