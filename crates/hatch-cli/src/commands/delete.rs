//! `hatch delete`: Remove a container's recorded state.

use clap::Args;
use hatch_common::error::HatchError;
use hatch_common::types::ContainerId;

use super::GlobalArgs;

/// Arguments for the `delete` command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Container ID.
    pub id: String,

    /// Succeed even if the container does not exist.
    #[arg(short, long)]
    pub force: bool,
}

/// Executes the `delete` command.
///
/// # Errors
///
/// Returns an error if the container is unknown (without `--force`) or its
/// state directory cannot be removed.
pub fn execute(global: &GlobalArgs, args: &DeleteArgs) -> anyhow::Result<()> {
    let id = ContainerId::new(args.id.as_str());
    match global.engine().delete(&id) {
        Ok(()) => Ok(()),
        Err(HatchError::NotFound { .. }) if args.force => {
            tracing::debug!(id = %id, "container already gone");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
