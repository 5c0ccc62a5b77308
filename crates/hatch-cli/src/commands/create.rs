//! `hatch create`: Create a container from a bundle.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hatch_common::constants::SPEC_FILE_NAME;
use hatch_common::types::ContainerId;
use hatch_runtime::engine::Engine;

use super::GlobalArgs;

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Bundle directory containing config.json.
    #[arg(short, long, default_value = ".")]
    pub bundle: PathBuf,

    /// Do not use pivot_root to jail the process inside the rootfs.
    #[arg(long)]
    pub no_pivot: bool,

    /// Do not create a new session keyring for the container.
    #[arg(long)]
    pub no_new_keyring: bool,

    /// Container ID. A random one is generated when omitted.
    pub id: Option<String>,
}

/// Executes the `create` command.
///
/// Prints the container ID on success. Rootless cgroups are used when
/// `--rootless` is passed or the caller is not root.
///
/// # Errors
///
/// Returns an error if any stage of container creation fails.
pub fn execute(global: &GlobalArgs, args: CreateArgs) -> anyhow::Result<()> {
    let id = args.id.map_or_else(ContainerId::generate, ContainerId::new);
    let mut config = global.runtime_config();
    config.no_pivot_root = args.no_pivot;
    config.no_new_keyring = args.no_new_keyring;

    let engine = Engine::new(config);
    let rootless = global.rootless || engine.host().rootless_euid();
    let spec_path = args.bundle.join(SPEC_FILE_NAME);
    tracing::debug!(id = %id, spec = %spec_path.display(), rootless, "create requested");

    engine
        .create(&id, &spec_path, rootless)
        .with_context(|| format!("creating container {id}"))?;
    println!("{id}");
    Ok(())
}
