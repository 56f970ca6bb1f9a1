use crate::cli::DemoArgs;
use crate::data;
use anyhow::Result;
use sigchain_simulation::{DemoConfig, DemoGenerator, NoiseConfig};

pub fn execute(args: DemoArgs) -> Result<()> {
    let mut config = DemoConfig {
        sampling_rate: args.rate,
        duration: args.duration,
        powerline_freq: Some(args.powerline),
        seed: Some(args.seed),
        ..DemoConfig::default()
    };
    if args.clean {
        config.noise = NoiseConfig::clean();
        config.powerline_freq = None;
    }

    let dataset = DemoGenerator::new(config)?.generate()?;
    let writer = data::output_writer(args.output.as_deref())?;
    data::write_dataset(&dataset, writer)
}
