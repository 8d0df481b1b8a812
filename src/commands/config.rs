//! # Config Command Implementation
//!
//! Composes the bundler configuration for the current project and prints it
//! as pretty JSON (or writes it to a file). The base configuration and the
//! optional override are read from JSON files so that any bundler driver can
//! consume the result.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use log::info;
use serde_json::{Value as JsonValue, json};

use assetwire::compose::{BaseConfig, Composer, Override};
use assetwire::entry::CollisionPolicy;
use assetwire::merge::set_path;

use super::ProjectArgs;

/// Compose the bundler configuration and print it as JSON
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// JSON file holding the base configuration.
    ///
    /// Defaults to `{"plugins": []}`.
    #[arg(long, value_name = "FILE")]
    pub base: Option<PathBuf>,

    /// JSON object of extra entries added after discovery.
    #[arg(long, value_name = "FILE", conflicts_with = "merge")]
    pub entries: Option<PathBuf>,

    /// JSON object deep-merged on top of the composed configuration.
    #[arg(long, value_name = "FILE")]
    pub merge: Option<PathBuf>,

    /// Set a single value after composition, e.g. `output.publicPath="/dist/"`.
    ///
    /// The value is parsed as JSON and falls back to a plain string.
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub set: Vec<String>,

    /// Fail when two source files produce the same entry name.
    #[arg(long)]
    pub strict: bool,

    /// Write the configuration to a file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Split `PATH=VALUE` into the path and its JSON value.
fn parse_assignment(assignment: &str) -> Result<(&str, JsonValue)> {
    let Some((path, raw)) = assignment.split_once('=') else {
        bail!("Expected PATH=VALUE, got '{}'", assignment);
    };
    let value = serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()));
    Ok((path.trim(), value))
}

/// Execute the `config` command.
pub fn execute(args: ConfigArgs) -> Result<()> {
    let ctx = args.project.context()?;

    let assignments = args
        .set
        .iter()
        .map(|assignment| parse_assignment(assignment))
        .collect::<Result<Vec<_>>>()?;

    let base = match &args.base {
        Some(path) => BaseConfig::Value(read_json(path)?),
        None => BaseConfig::Value(json!({ "plugins": [] })),
    };

    let overrides = if let Some(path) = &args.entries {
        match read_json(path)? {
            JsonValue::Object(entries) => Some(Override::Entries(entries)),
            _ => bail!("{} must contain a JSON object of entries", path.display()),
        }
    } else if let Some(path) = &args.merge {
        let partial = read_json(path)?;
        Some(Override::transform(move |_| partial.clone()))
    } else {
        None
    };

    let policy = if args.strict {
        CollisionPolicy::Strict
    } else {
        CollisionPolicy::LastWriteWins
    };

    let mut config = Composer::new(&ctx)
        .collision_policy(policy)
        .compose(&base, overrides.as_ref())?;

    for (path, value) in assignments {
        set_path(&mut config, path, value)?;
    }

    let rendered = serde_json::to_string_pretty(&config)?;
    match &args.out {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Configuration written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
