//! Binary crate for the `weather-dash` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the interactive session
//! - Human-friendly terminal rendering

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod logging;
mod session;
mod view;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    logging::init_logging(cmd.verbose);
    cmd.run().await
}
