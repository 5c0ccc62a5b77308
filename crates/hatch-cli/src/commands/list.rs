//! `hatch list`: List known containers.

use clap::Args;

use super::GlobalArgs;
use crate::output;

/// Arguments for the `list` command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print container IDs only.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Executes the `list` command.
///
/// # Errors
///
/// Returns an error if the state root cannot be read.
pub fn execute(global: &GlobalArgs, args: &ListArgs) -> anyhow::Result<()> {
    let containers = global.engine().list()?;

    if args.quiet {
        for c in &containers {
            println!("{}", c.id);
        }
        return Ok(());
    }

    if containers.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    println!(
        "{:<40} {:<8} {:<18} {:<20} {}",
        "ID", "STATE", "DRIVER", "CREATED", "BUNDLE"
    );
    for c in &containers {
        println!(
            "{:<40} {:<8} {:<18} {:<20} {}",
            c.id,
            c.state,
            c.cgroup_driver,
            output::format_timestamp(&c.created_at),
            c.bundle.display()
        );
    }

    Ok(())
}
