//! seatctl - exam seat allocation from the command line
//!
//! Manages batches of examinees and the room list, imports rosters and runs
//! allocation passes. All state lives in a single JSON state file.

use anyhow::Result;
use clap::Parser;

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod resolve;
mod state;

use commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run() {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}
