use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use job_escrow::cli::{commands, Cli};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    tokio::runtime::Runtime::new()?.block_on(commands::run(cli))
}
