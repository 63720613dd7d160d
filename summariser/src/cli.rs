use std::path::PathBuf;

use clap::Parser;
use edr_summariser::{
    Decoding, SummariseOptions, DEFAULT_DATA_DIR, DEFAULT_DURATION_SEC, DEFAULT_WORKLOAD,
};

#[derive(Parser)]
#[command(about, long_about = None)]
pub struct CliArgs {
    /// Identifier of the run. Used verbatim in the input and output paths.
    #[arg(long)]
    pub run_id: String,

    /// Label of the workload that was run.
    #[arg(long, default_value = DEFAULT_WORKLOAD)]
    pub workload: String,

    /// Duration the run was configured with, in seconds.
    #[arg(long, default_value_t = DEFAULT_DURATION_SEC)]
    pub duration_sec: u64,

    /// Directory holding the `raw/<run-id>/` exports and the `processed/` summaries.
    #[arg(long, env = "EDR_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// How to treat bytes in the exports that are not valid UTF-8.
    #[arg(long, value_enum, default_value_t = Decoding::Lenient)]
    pub decoding: Decoding,
}

impl From<CliArgs> for SummariseOptions {
    fn from(args: CliArgs) -> Self {
        SummariseOptions::new(args.run_id)
            .data_dir(args.data_dir)
            .workload(&args.workload)
            .duration_sec(args.duration_sec)
            .decoding(args.decoding)
    }
}
