//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// assetwire - Discover asset entries and compose bundler configurations
#[derive(Parser, Debug)]
#[command(name = "assetwire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose the bundler configuration and print it as JSON
    Config(commands::config::ConfigArgs),

    /// List the discovered asset entries
    Entries(commands::entries::EntriesArgs),

    /// List the discovered packages
    Packages(commands::packages::PackagesArgs),

    /// Transform package sources into their build directories
    BuildPackages(commands::build_packages::BuildPackagesArgs),

    /// Watch package sources and rebuild changed files
    Watch(commands::watch::WatchArgs),

    /// Run a build script with node and mirror its exit code
    Run(commands::run::RunArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Config(args) => commands::config::execute(args),
            Commands::Entries(args) => commands::entries::execute(args, &self.color),
            Commands::Packages(args) => commands::packages::execute(args, &self.color),
            Commands::BuildPackages(args) => commands::build_packages::execute(args, &self.color),
            Commands::Watch(args) => commands::watch::execute(args, &self.color),
            Commands::Run(args) => commands::run::execute(args),
        }
    }
}

/// Initialize `env_logger`, letting `RUST_LOG` override the flag.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialization (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
