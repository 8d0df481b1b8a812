//! # Run Command Implementation
//!
//! Runs `<scripts-dir>/<script>.js` with node, forwarding the remaining
//! arguments, and exits with the script's exit code.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::Args;
use log::debug;

/// Run a build script with node and mirror its exit code
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Script name, without the `.js` extension.
    pub script: String,

    /// Arguments passed to the script.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Directory holding the scripts.
    #[arg(long, value_name = "DIR", default_value = "scripts", env = "ASSETWIRE_SCRIPTS_DIR")]
    pub scripts_dir: PathBuf,

    /// Node executable.
    #[arg(long, value_name = "PATH", default_value = "node")]
    pub node: String,
}

/// Resolve the script file for `name`.
fn script_path(scripts_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        bail!("Invalid script name '{}'", name);
    }
    let path = scripts_dir.join(format!("{}.js", name));
    if !path.is_file() {
        bail!("Unknown script \"{}\" (looked for {})", name, path.display());
    }
    Ok(path)
}

/// Execute the `run` command.
pub fn execute(args: RunArgs) -> Result<()> {
    let script = script_path(&args.scripts_dir, &args.script)?;
    debug!("Running {} {} {:?}", args.node, script.display(), args.args);

    let status = Command::new(&args.node)
        .arg(&script)
        .args(&args.args)
        .status()
        .with_context(|| format!("Failed to start '{}'", args.node))?;

    // Killed by a signal: no exit code to mirror.
    std::process::exit(status.code().unwrap_or(1));
}
