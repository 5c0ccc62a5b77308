//! Resource strategy resolution.
//!
//! Turns the runtime's root directory and privilege flags into a
//! [`ResourceStrategy`]: the cgroup driver, the optional Intel RDT manager,
//! and the helper binaries the engine needs. Resolution only reads host
//! state; it never creates a container.

use std::path::{Path, PathBuf};

use hatch_common::constants::{NEWGIDMAP, NEWUIDMAP};
use hatch_common::error::{HatchError, Result};
use hatch_common::types::{CgroupDriver, ContainerId};
use hatch_core::host::HostProbe;
use serde::Serialize;

use crate::backend::ContainerBackend;
use crate::specconv::ContainerConfig;

/// Inputs to [`resolve_strategy`].
#[derive(Debug, Clone, Copy)]
pub struct FactoryOptions<'a> {
    /// State root directory, possibly relative.
    pub root: &'a Path,
    /// Operate without host privileges.
    pub rootless: bool,
    /// Delegate cgroup management to systemd.
    pub systemd_cgroup: bool,
    /// Checkpoint/restore helper. An empty path means none.
    pub criu: &'a Path,
}

/// Intel RDT manager handed to the engine when the host supports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntelRdt {
    /// Cache allocation is available.
    pub cat: bool,
    /// Memory bandwidth allocation is available.
    pub mba: bool,
}

/// Everything the engine needs to create containers on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStrategy {
    root: PathBuf,
    cgroup_driver: CgroupDriver,
    intel_rdt: Option<IntelRdt>,
    criu: Option<PathBuf>,
    newuidmap: Option<PathBuf>,
    newgidmap: Option<PathBuf>,
}

impl ResourceStrategy {
    /// Absolute state root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Selected cgroup driver.
    #[must_use]
    pub const fn cgroup_driver(&self) -> CgroupDriver {
        self.cgroup_driver
    }

    /// Intel RDT manager, absent when the host offers neither CAT nor MBA.
    #[must_use]
    pub const fn intel_rdt(&self) -> Option<IntelRdt> {
        self.intel_rdt
    }

    /// Checkpoint/restore helper.
    #[must_use]
    pub fn criu(&self) -> Option<&Path> {
        self.criu.as_deref()
    }

    /// `newuidmap` helper, if found on the search path.
    #[must_use]
    pub fn newuidmap(&self) -> Option<&Path> {
        self.newuidmap.as_deref()
    }

    /// `newgidmap` helper, if found on the search path.
    #[must_use]
    pub fn newgidmap(&self) -> Option<&Path> {
        self.newgidmap.as_deref()
    }

    /// Creates a container through `backend` using this strategy.
    ///
    /// # Errors
    ///
    /// Returns [`HatchError::CreationFailed`] for any backend failure.
    pub fn create(
        &self,
        backend: &dyn ContainerBackend,
        id: &ContainerId,
        config: &ContainerConfig,
    ) -> Result<()> {
        tracing::info!(
            id = %id,
            driver = %self.cgroup_driver,
            root = %self.root.display(),
            "creating container"
        );
        backend.create(self, id, config).map_err(|e| match e {
            HatchError::CreationFailed { .. } => e,
            other => HatchError::CreationFailed {
                id: id.to_string(),
                reason: other.to_string(),
            },
        })
    }
}

/// Resolves the [`ResourceStrategy`] for this host.
///
/// Missing helpers and missing RDT support are not errors: they resolve to
/// `None` and any consequence surfaces when the engine needs them.
///
/// # Errors
///
/// - [`HatchError::PathError`] if the root cannot be made absolute.
/// - [`HatchError::UnsupportedConfiguration`] if systemd cgroups are
///   requested but unavailable.
pub fn resolve_strategy(opts: &FactoryOptions<'_>, host: &dyn HostProbe) -> Result<ResourceStrategy> {
    let root = std::path::absolute(opts.root).map_err(|e| HatchError::PathError {
        path: opts.root.to_path_buf(),
        source: e,
    })?;
    let cgroup_driver = select_cgroup_driver(opts.rootless, opts.systemd_cgroup, host)?;

    let (cat, mba) = (host.rdt_cat_enabled(), host.rdt_mba_enabled());
    let intel_rdt = (cat || mba).then_some(IntelRdt { cat, mba });

    let strategy = ResourceStrategy {
        root,
        cgroup_driver,
        intel_rdt,
        criu: (!opts.criu.as_os_str().is_empty()).then(|| opts.criu.to_path_buf()),
        newuidmap: host.look_path(NEWUIDMAP),
        newgidmap: host.look_path(NEWGIDMAP),
    };
    tracing::debug!(
        root = %strategy.root.display(),
        driver = %strategy.cgroup_driver,
        intel_rdt = ?strategy.intel_rdt,
        newuidmap = ?strategy.newuidmap,
        newgidmap = ?strategy.newgidmap,
        "resource strategy resolved"
    );
    Ok(strategy)
}

/// Picks the cgroup driver. The systemd check applies whether or not
/// `rootless` is also set.
fn select_cgroup_driver(
    rootless: bool,
    systemd_cgroup: bool,
    host: &dyn HostProbe,
) -> Result<CgroupDriver> {
    let mut driver = CgroupDriver::Cgroupfs;
    if rootless {
        driver = CgroupDriver::RootlessCgroupfs;
    }
    if systemd_cgroup {
        if !host.systemd_cgroups_available() {
            return Err(HatchError::UnsupportedConfiguration {
                message: "systemd cgroup flag passed, but systemd support for managing cgroups is not available".into(),
            });
        }
        driver = CgroupDriver::Systemd;
    }
    Ok(driver)
}
