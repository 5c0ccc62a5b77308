//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default root directory for container state when running as root.
pub const SYSTEM_ROOT_DIR: &str = "/run/hatch";

/// Returns the state root, preferring `$XDG_RUNTIME_DIR/hatch` when a
/// per-user runtime directory is available, falling back to `/run/hatch`.
fn resolve_root_dir() -> PathBuf {
    match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(APP_NAME),
        _ => PathBuf::from(SYSTEM_ROOT_DIR),
    }
}

static ROOT_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved state root directory for this session.
pub fn root_dir() -> &'static PathBuf {
    ROOT_DIR.get_or_init(resolve_root_dir)
}

/// Name of the specification file inside a bundle directory.
pub const SPEC_FILE_NAME: &str = "config.json";

/// Name of the per-container state file under the root directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// OCI runtime specification version written by `hatch spec`.
pub const OCI_VERSION: &str = "1.0.2";

/// Default checkpoint/restore helper binary.
pub const DEFAULT_CRIU: &str = "criu";

/// Helper binary that writes UID mappings for unprivileged user namespaces.
pub const NEWUIDMAP: &str = "newuidmap";

/// Helper binary that writes GID mappings for unprivileged user namespaces.
pub const NEWGIDMAP: &str = "newgidmap";

/// Directory that exists only when systemd is the running init system.
pub const SYSTEMD_RUNTIME_DIR: &str = "/run/systemd/system";

/// Mount table of the calling process.
pub const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";

/// CPU feature listing.
pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Security context of the calling process.
pub const SELINUX_CURRENT_ATTR: &str = "/proc/self/attr/current";

/// Filesystem type of the SELinux pseudo-filesystem.
pub const SELINUX_FS_TYPE: &str = "selinuxfs";

/// Filesystem type of the Intel RDT resource-control filesystem.
pub const RESCTRL_FS_TYPE: &str = "resctrl";

/// Application name used in CLI output and state paths.
pub const APP_NAME: &str = "hatch";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "hatch";
