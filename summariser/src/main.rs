use clap::Parser as _;
use edr_summariser::{summarise_run, SummariseOptions};
use log::info;

mod cli;

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = cli::CliArgs::parse();
    info!("{CRATE_NAME} {CRATE_VERSION}");

    let options = SummariseOptions::from(args);
    info!(
        "Summarising run {} (workload: {}, duration: {}s) from {}",
        options.run_id,
        options.workload,
        options.duration_sec,
        options.data_dir.display()
    );

    summarise_run(&options, std::io::stdout().lock())?;

    Ok(())
}
