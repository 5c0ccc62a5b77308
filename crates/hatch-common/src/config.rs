//! Global configuration model for the Hatch runtime.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime-wide settings applied to every creation request.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding per-container state.
    pub root: PathBuf,
    /// Delegate cgroup management to systemd.
    pub systemd_cgroup: bool,
    /// Path (or bare name) of the checkpoint/restore helper. Empty means none.
    pub criu: PathBuf,
    /// Use `MS_MOVE` + chroot instead of `pivot_root(2)` for the rootfs.
    pub no_pivot_root: bool,
    /// Keep the session keyring instead of creating a new one.
    pub no_new_keyring: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            root: crate::constants::root_dir().clone(),
            systemd_cgroup: false,
            criu: PathBuf::from(crate::constants::DEFAULT_CRIU),
            no_pivot_root: false,
            no_new_keyring: false,
        }
    }
}
