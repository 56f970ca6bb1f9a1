use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sigchain",
    version,
    about = "Filter chain engine for recorded biosignals",
    long_about = "Apply a reorderable chain of filters to one channel of a CSV recording,\n\
                  inspect its spectrum and export the result or an equivalent Python script."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a seeded demo recording as CSV
    Demo(DemoArgs),
    /// Run the filter chain over a channel and export CSV
    Process(ProcessArgs),
    /// Print the spectrum or PSD of the processed channel
    Spectrum(SpectrumArgs),
    /// Print a Python script reproducing the pipeline
    Script(ScriptArgs),
    /// List filter kinds with their default parameters
    Kinds(KindsArgs),
}

#[derive(Args)]
pub struct DemoArgs {
    /// Output CSV file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Recording length in seconds
    #[arg(long, default_value_t = 10.0)]
    pub duration: f64,

    /// Sampling rate in Hz
    #[arg(long, default_value_t = 250.0)]
    pub rate: f64,

    /// Powerline frequency in Hz
    #[arg(long, default_value_t = 50.0)]
    pub powerline: f64,

    /// Disable noise, drift, spikes and powerline interference
    #[arg(long, default_value_t = false)]
    pub clean: bool,
}

/// Pipeline selection shared by subcommands
#[derive(Args)]
pub struct PipelineArgs {
    /// Pipeline JSON document
    #[arg(long, conflicts_with = "preset")]
    pub pipeline: Option<PathBuf>,

    /// Built-in pipeline (eeg-cleanup, spike-removal, powerline-removal)
    #[arg(long)]
    pub preset: Option<String>,
}

/// Data source, channel and window shared by subcommands
#[derive(Args)]
pub struct SourceArgs {
    /// Input CSV file with a header row
    #[arg(short, long)]
    pub input: PathBuf,

    /// Channel to process (default: first non-time column)
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Sampling rate in Hz (default: pipeline document, then estimated)
    #[arg(long)]
    pub rate: Option<f64>,

    /// Window start in seconds
    #[arg(long, requires = "end")]
    pub start: Option<f64>,

    /// Window end in seconds
    #[arg(long, requires = "start")]
    pub end: Option<f64>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output CSV file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the effective pipeline document here
    #[arg(long)]
    pub save_pipeline: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Direct,
    Fast,
}

#[derive(Args)]
pub struct SpectrumArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print dB power instead of magnitude
    #[arg(long, default_value_t = false)]
    pub psd: bool,

    /// Highest frequency to print in Hz
    #[arg(long)]
    pub max_frequency: Option<f64>,

    /// Spectral estimator
    #[arg(long, value_enum, default_value_t = MethodArg::Direct)]
    pub method: MethodArg,

    /// Print only the largest bin
    #[arg(long, default_value_t = false)]
    pub peak: bool,

    /// JSON output
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ScriptArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Channel column the script reads
    #[arg(short, long, default_value = "signal")]
    pub channel: String,

    /// Sampling rate in Hz (default: pipeline document, else 250)
    #[arg(long)]
    pub rate: Option<f64>,

    /// CSV path the script loads
    #[arg(long, default_value = "data.csv")]
    pub data_path: String,

    /// CSV path the script writes
    #[arg(long, default_value = "processed.csv")]
    pub output_path: String,
}

#[derive(Args)]
pub struct KindsArgs {
    /// JSON output
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
