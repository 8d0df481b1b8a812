//! # Packages Command Implementation
//!
//! Lists the buildable packages found by the package pattern groups along
//! with the names derived for them.

use anyhow::Result;
use clap::Args;

use assetwire::compose::Composer;
use assetwire::output::{Marker, OutputConfig};
use assetwire::project::camel_case_dash;

use super::ProjectArgs;

/// List the discovered packages
#[derive(Args, Debug)]
pub struct PackagesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the package descriptors as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `packages` command.
pub fn execute(args: PackagesArgs, color_flag: &str) -> Result<()> {
    let ctx = args.project.context()?;
    let composer = Composer::new(&ctx);
    composer.validate_patterns()?;
    let packages = composer.discover()?.packages;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    let out = OutputConfig::from_env_and_flag(color_flag);
    if packages.is_empty() {
        println!(
            "{} No packages found in {}",
            out.marker(Marker::Info),
            ctx.source_path.display()
        );
        return Ok(());
    }

    println!(
        "{} {} (global {}, handle {}, namespace {})",
        out.marker(Marker::Info),
        ctx.project_name,
        ctx.project_external(),
        ctx.project_handle(),
        ctx.project_namespace()
    );
    for package in &packages {
        println!("{}", out.heading(&package.name));
        println!("  entry     {}", package.entry_name());
        let library = ctx
            .settings
            .library_name
            .clone()
            .unwrap_or_else(|| camel_case_dash(&package.external_name));
        println!("  global    {}.{}", library, camel_case_dash(&package.package_name));
        println!("  handle    {}", package.handle_name);
        println!("  main      {}", out.dim(&package.main.display().to_string()));
    }
    println!("{} {} package(s)", out.marker(Marker::Done), packages.len());

    Ok(())
}
