//! # Build Packages Command Implementation
//!
//! Runs the transform command over package sources. Without file arguments
//! every source file of every buildable package is processed with a progress
//! bar; with file arguments only those files are rebuilt, stylesheets being
//! replaced by their package's entry points.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;

use assetwire::build::{
    BatchBuilder, BatchReport, SourceFilter, collect_sources, expand_stylesheets,
};
use assetwire::output::{Marker, OutputConfig};
use assetwire::package::discover_package_roots;
use assetwire::project::ProjectContext;

use super::ProjectArgs;

/// Options shared by `build-packages` and `watch`.
#[derive(Args, Debug, Clone)]
pub struct TransformArgs {
    /// Command run as `<COMMAND> <source> <destination>` for every file.
    #[arg(long, value_name = "COMMAND", env = "ASSETWIRE_TRANSFORM")]
    pub transform: String,

    /// Command run as `<COMMAND> --project <tsconfig>` for typed packages.
    #[arg(long, value_name = "COMMAND", default_value = "tsc")]
    pub declarations: String,

    /// Skip the type declaration step.
    #[arg(long)]
    pub no_declarations: bool,

    /// Number of parallel transforms (defaults to the number of CPUs).
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl TransformArgs {
    /// Build the batch runner described by these options.
    ///
    /// Transforms see the project's mode as `NODE_ENV` and its transpiler
    /// cache as `BABEL_CACHE_DIRECTORY`.
    pub fn builder(&self, ctx: &ProjectContext) -> BatchBuilder {
        let split = |command: &str| -> Vec<String> {
            command.split_whitespace().map(str::to_string).collect()
        };
        let mut builder = BatchBuilder::new(split(&self.transform))
            .declaration_command((!self.no_declarations).then(|| split(&self.declarations)))
            .env("NODE_ENV", ctx.mode.as_str())
            .env("BABEL_CACHE_DIRECTORY", ctx.babel_cache_directory().to_string_lossy());
        if let Some(jobs) = self.jobs {
            builder = builder.jobs(jobs);
        }
        builder
    }
}

/// Transform package sources into their build directories
#[derive(Args, Debug)]
pub struct BuildPackagesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub transform: TransformArgs,

    /// Hide the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Only rebuild these files.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Find the buildable package roots of a project or fail with a hint.
pub fn package_roots(ctx: &ProjectContext) -> Result<Vec<PathBuf>> {
    for group in ctx.package_patterns() {
        group.validate()?;
    }
    let roots = discover_package_roots(&ctx.source_path, &ctx.package_patterns())?;
    if roots.is_empty() {
        bail!(
            "No packages found in {}. Make sure each package declares \"module\" or \"main\" in its package.json.",
            ctx.source_path.display()
        );
    }
    Ok(roots)
}

/// Print the outcome of a batch and turn failures into an error.
pub fn report(out: &OutputConfig, report: &BatchReport) -> Result<()> {
    for failure in &report.failures {
        eprintln!("{} {}", out.marker(Marker::Failed), failure);
    }
    for root in &report.declaration_failures {
        eprintln!(
            "{} Failed to generate types for {}",
            out.marker(Marker::Failed),
            root.display()
        );
    }
    println!(
        "{} Built {} file(s), {} failure(s)",
        out.marker(if report.is_success() { Marker::Done } else { Marker::Failed }),
        report.built.len(),
        report.failures.len() + report.declaration_failures.len()
    );

    if !report.is_success() {
        bail!("Package build failed");
    }
    Ok(())
}

/// Execute the `build-packages` command.
pub fn execute(args: BuildPackagesArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ctx = args.project.context()?;
    let roots = package_roots(&ctx)?;

    let explicit = !args.files.is_empty();
    let files = if explicit {
        let cwd = std::env::current_dir()?;
        let absolute: Vec<PathBuf> = args.files.iter().map(|f| cwd.join(f)).collect();
        expand_stylesheets(&absolute, &roots)
    } else {
        collect_sources(&roots, &SourceFilter::new()?)
    };

    println!(
        "{} Building {} file(s) in {} package(s)",
        out.marker(Marker::Info),
        files.len(),
        roots.len()
    );

    let builder = args
        .transform
        .builder(&ctx)
        .progress(!explicit && !args.no_progress);
    let batch = builder.run(&files, &roots)?;
    report(&out, &batch)
}
