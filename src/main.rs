//! # assetwire CLI
//!
//! Binary entry point for the `assetwire` command-line tool.
//!
//! Its responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Initializing logging from the global `--log-level` flag.
//! - Dispatching to the selected command and reporting its errors.
//!
//! All discovery and composition logic lives in the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
