use std::process::ExitCode;

use clap::Parser;
use detsync_cli::{run, Args};
use detsync_core::errors::ErrorCode;
use detsync_core::tracing::init_tracing;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level());

    match run(&args) {
        Ok(report) => {
            tracing::debug!(?report, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e.coded_message());
            ExitCode::FAILURE
        }
    }
}
