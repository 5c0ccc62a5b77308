//! CLI command definitions and dispatch.

pub mod create;
pub mod delete;
pub mod features;
pub mod list;
pub mod spec;
pub mod state;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hatch_common::config::RuntimeConfig;
use hatch_common::constants::DEFAULT_CRIU;
use hatch_runtime::engine::Engine;

/// Hatch, a daemon-less low-level container runtime.
#[derive(Parser, Debug)]
#[command(name = "hatch", version, about, long_about = None)]
pub struct Cli {
    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[allow(clippy::struct_excessive_bools)]
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory for container state [default: /run/hatch, or
    /// $XDG_RUNTIME_DIR/hatch when set].
    #[arg(long, global = true, env = "HATCH_ROOT")]
    pub root: Option<PathBuf>,

    /// Manage cgroups without host privileges.
    #[arg(long, global = true)]
    pub rootless: bool,

    /// Delegate cgroup management to systemd.
    #[arg(long, global = true)]
    pub systemd_cgroup: bool,

    /// Checkpoint/restore helper binary. Pass an empty value to disable.
    #[arg(long, global = true, default_value = DEFAULT_CRIU)]
    pub criu: String,

    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Text,
        env = "HATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

impl GlobalArgs {
    /// Builds the runtime configuration these flags describe.
    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        let defaults = RuntimeConfig::default();
        RuntimeConfig {
            root: self.root.clone().unwrap_or(defaults.root),
            systemd_cgroup: self.systemd_cgroup,
            criu: PathBuf::from(&self.criu),
            ..defaults
        }
    }

    /// Builds an engine for the real host.
    #[must_use]
    pub fn engine(&self) -> Engine {
        Engine::new(self.runtime_config())
    }
}

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a container from a bundle.
    Create(create::CreateArgs),
    /// Print the recorded state of a container.
    State(state::StateArgs),
    /// List known containers.
    List(list::ListArgs),
    /// Remove a container's recorded state.
    Delete(delete::DeleteArgs),
    /// Write an example config.json into a bundle.
    Spec(spec::SpecArgs),
    /// Report which optional host features are available.
    Features(features::FeaturesArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Create(args) => create::execute(&global, args),
        Command::State(args) => state::execute(&global, &args),
        Command::List(args) => list::execute(&global, &args),
        Command::Delete(args) => delete::execute(&global, &args),
        Command::Spec(args) => spec::execute(&args),
        Command::Features(args) => features::execute(&args),
    }
}
