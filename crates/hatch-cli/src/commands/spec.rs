//! `hatch spec`: Write an example config.json into a bundle.

use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use hatch_common::constants::SPEC_FILE_NAME;
use hatch_runtime::spec::Specification;

/// Arguments for the `spec` command.
#[derive(Args, Debug)]
pub struct SpecArgs {
    /// Bundle directory to write config.json into.
    #[arg(short, long, default_value = ".")]
    pub bundle: PathBuf,

    /// Generate a configuration for a rootless container, mapping the
    /// caller's uid and gid to root inside a user namespace.
    #[arg(long)]
    pub rootless: bool,
}

/// Executes the `spec` command.
///
/// # Errors
///
/// Returns an error if config.json already exists or cannot be written.
pub fn execute(args: &SpecArgs) -> anyhow::Result<()> {
    let spec = if args.rootless {
        Specification::rootless_example(
            nix::unistd::geteuid().as_raw(),
            nix::unistd::getegid().as_raw(),
        )
    } else {
        Specification::example()
    };
    let path = write_spec(&args.bundle, &spec)?;
    tracing::info!(path = %path.display(), rootless = args.rootless, "example specification written");
    Ok(())
}

/// Writes `spec` to `<bundle>/config.json`, refusing to overwrite.
fn write_spec(bundle: &Path, spec: &Specification) -> anyhow::Result<PathBuf> {
    let path = bundle.join(SPEC_FILE_NAME);
    let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            anyhow::bail!("{} exists. Remove it first", path.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("cannot create {}", path.display()));
        }
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, spec)?;
    writer
        .flush()
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}
