//! # Entries Command Implementation
//!
//! Lists the entries the asset pattern groups discover, grouped by category.

use anyhow::Result;
use clap::Args;

use assetwire::compose::Composer;
use assetwire::entry::CollisionPolicy;
use assetwire::output::{Marker, OutputConfig};

use super::ProjectArgs;

/// List the discovered asset entries
#[derive(Args, Debug)]
pub struct EntriesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the entry map as JSON.
    #[arg(long)]
    pub json: bool,

    /// Fail when two source files produce the same entry name.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `entries` command.
pub fn execute(args: EntriesArgs, color_flag: &str) -> Result<()> {
    let ctx = args.project.context()?;
    let policy = if args.strict {
        CollisionPolicy::Strict
    } else {
        CollisionPolicy::LastWriteWins
    };

    let composer = Composer::new(&ctx).collision_policy(policy);
    composer.validate_patterns()?;
    let discovery = composer.discover()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&discovery.entries)?);
        return Ok(());
    }

    let out = OutputConfig::from_env_and_flag(color_flag);
    if discovery.entries.is_empty() {
        println!(
            "{} No entries found in {}",
            out.marker(Marker::Info),
            ctx.source_path.display()
        );
        return Ok(());
    }

    let mut current_category = "";
    for (name, file) in discovery.entries.iter() {
        let category = name.split('/').next().unwrap_or(name);
        if category != current_category {
            println!("{}", out.heading(category));
            current_category = category;
        }
        let relative = file.strip_prefix(&ctx.source_path).unwrap_or(file);
        println!("  {}  {}", name, out.dim(&relative.display().to_string()));
    }
    println!(
        "{} {} entr{}",
        out.marker(Marker::Done),
        discovery.entries.len(),
        if discovery.entries.len() == 1 { "y" } else { "ies" }
    );

    Ok(())
}
