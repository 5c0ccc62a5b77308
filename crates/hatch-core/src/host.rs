//! The host capability interface consumed by the runtime.

use std::path::PathBuf;

use serde::Serialize;

/// Read-only queries about the host that shape container creation.
///
/// Every query is bounded and side-effect free. Implementors must be
/// shareable across threads because concurrent creation requests may
/// consult the same host handle.
pub trait HostProbe: Send + Sync {
    /// Whether the SELinux subsystem is enabled.
    fn selinux_enabled(&self) -> bool;

    /// Whether the init system supports delegated cgroup management.
    fn systemd_cgroups_available(&self) -> bool;

    /// Whether Intel RDT cache allocation is available.
    fn rdt_cat_enabled(&self) -> bool;

    /// Whether Intel RDT memory bandwidth allocation is available.
    fn rdt_mba_enabled(&self) -> bool;

    /// Resolves a helper binary through the search path.
    fn look_path(&self, binary: &str) -> Option<PathBuf>;

    /// Whether the effective user is unprivileged on the host.
    fn rootless_euid(&self) -> bool;
}

/// [`HostProbe`] backed by the running kernel and filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostProbe for SystemHost {
    fn selinux_enabled(&self) -> bool {
        crate::selinux::is_enabled()
    }

    fn systemd_cgroups_available(&self) -> bool {
        crate::systemd::cgroups_supported()
    }

    fn rdt_cat_enabled(&self) -> bool {
        crate::intelrdt::is_cat_enabled()
    }

    fn rdt_mba_enabled(&self) -> bool {
        crate::intelrdt::is_mba_enabled()
    }

    fn look_path(&self, binary: &str) -> Option<PathBuf> {
        match which::which(binary) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::debug!(binary, error = %e, "helper not found in search path");
                None
            }
        }
    }

    fn rootless_euid(&self) -> bool {
        !nix::unistd::geteuid().is_root()
    }
}

/// Snapshot of every capability a [`HostProbe`] reports.
///
/// A report is itself a [`HostProbe`] that replays the captured answers,
/// which makes it usable as a fixed host in tests and dry runs.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostReport {
    /// SELinux enabled.
    pub selinux: bool,
    /// systemd cgroup delegation available.
    pub systemd_cgroups: bool,
    /// Intel RDT cache allocation.
    pub rdt_cat: bool,
    /// Intel RDT memory bandwidth allocation.
    pub rdt_mba: bool,
    /// Resolved `newuidmap` helper.
    pub newuidmap: Option<PathBuf>,
    /// Resolved `newgidmap` helper.
    pub newgidmap: Option<PathBuf>,
    /// Running without host privileges.
    pub rootless_euid: bool,
}

impl HostReport {
    /// Queries every capability of `host`.
    pub fn collect(host: &dyn HostProbe) -> Self {
        Self {
            selinux: host.selinux_enabled(),
            systemd_cgroups: host.systemd_cgroups_available(),
            rdt_cat: host.rdt_cat_enabled(),
            rdt_mba: host.rdt_mba_enabled(),
            newuidmap: host.look_path(hatch_common::constants::NEWUIDMAP),
            newgidmap: host.look_path(hatch_common::constants::NEWGIDMAP),
            rootless_euid: host.rootless_euid(),
        }
    }
}

impl HostProbe for HostReport {
    fn selinux_enabled(&self) -> bool {
        self.selinux
    }

    fn systemd_cgroups_available(&self) -> bool {
        self.systemd_cgroups
    }

    fn rdt_cat_enabled(&self) -> bool {
        self.rdt_cat
    }

    fn rdt_mba_enabled(&self) -> bool {
        self.rdt_mba
    }

    fn look_path(&self, binary: &str) -> Option<PathBuf> {
        match binary {
            hatch_common::constants::NEWUIDMAP => self.newuidmap.clone(),
            hatch_common::constants::NEWGIDMAP => self.newgidmap.clone(),
            _ => None,
        }
    }

    fn rootless_euid(&self) -> bool {
        self.rootless_euid
    }
}
