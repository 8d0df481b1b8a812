//! # CLI Command Implementations
//!
//! Each subcommand of `assetwire` lives in its own module with:
//! - an `Args` struct derived with `clap`;
//! - an `execute` function taking the parsed arguments and calling into the
//!   `assetwire` library.
//!
//! Arguments shared by every project-aware command are collected in
//! [`ProjectArgs`].

pub mod build_packages;
pub mod config;
pub mod entries;
pub mod packages;
pub mod run;
pub mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use assetwire::project::{Mode, ProjectContext};

/// Project selection and path overrides.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Directory inside the project; the nearest package.json above it is used.
    #[arg(short = 'C', long = "project-dir", value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Source directory, relative to the project root.
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Output directory, relative to the project root.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Build mode (development or production); defaults to NODE_ENV.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<Mode>,
}

impl ProjectArgs {
    /// Resolve the project context, applying the flags last.
    pub fn context(&self) -> Result<ProjectContext> {
        let dir = self
            .project_dir
            .canonicalize()
            .with_context(|| format!("Project directory not found: {}", self.project_dir.display()))?;
        let mut ctx = ProjectContext::discover(&dir)
            .with_context(|| format!("Failed to load project at {}", dir.display()))?;
        if let Some(source) = &self.source {
            ctx = ctx.with_source(source);
        }
        if let Some(output) = &self.output {
            ctx = ctx.with_output(output);
        }
        if let Some(mode) = self.mode {
            ctx = ctx.with_mode(mode);
        }
        Ok(ctx)
    }
}
