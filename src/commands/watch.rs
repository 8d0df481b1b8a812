//! # Watch Command Implementation
//!
//! Watches the `src` directories of all buildable packages and rebuilds
//! changed files in debounced batches until interrupted.

use anyhow::Result;
use clap::Args;
use log::warn;

use assetwire::build::expand_stylesheets;
use assetwire::output::{Marker, OutputConfig};
use assetwire::watch::PackageWatcher;

use super::ProjectArgs;
use super::build_packages::{TransformArgs, package_roots};

/// Watch package sources and rebuild changed files
#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub transform: TransformArgs,
}

/// Execute the `watch` command.
pub fn execute(args: WatchArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ctx = args.project.context()?;
    let roots = package_roots(&ctx)?;
    let builder = args.transform.builder(&ctx);

    let mut watcher = PackageWatcher::new(roots.clone())?;
    println!(
        "{} Watching {} package(s) for changes...",
        out.marker(Marker::Info),
        roots.len()
    );

    watcher.run(|batch| {
        let files = expand_stylesheets(&batch, &roots);
        let report = builder.run(&files, &roots)?;
        for file in &report.built {
            println!("{} {}", out.marker(Marker::Added), file.display());
        }
        for failure in &report.failures {
            eprintln!("{} {}", out.marker(Marker::Failed), failure);
        }
        if !report.declaration_failures.is_empty() {
            warn!(
                "Type declarations failed for {} package(s)",
                report.declaration_failures.len()
            );
        }
        Ok(())
    })?;

    Ok(())
}
