//! `hatch state`: Print the recorded state of a container.

use clap::Args;
use hatch_common::types::ContainerId;

use super::GlobalArgs;

/// Arguments for the `state` command.
#[derive(Args, Debug)]
pub struct StateArgs {
    /// Container ID.
    pub id: String,
}

/// Executes the `state` command, printing the record as JSON.
///
/// # Errors
///
/// Returns an error if the container is unknown or its state is unreadable.
pub fn execute(global: &GlobalArgs, args: &StateArgs) -> anyhow::Result<()> {
    let entry = global.engine().state(&ContainerId::new(args.id.as_str()))?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}
