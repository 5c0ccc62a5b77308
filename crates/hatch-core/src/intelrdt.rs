//! Intel Resource Director Technology probes.
//!
//! A feature is usable only when the CPU advertises it *and* the kernel
//! exposes it through a mounted `resctrl` filesystem:
//!
//! | Feature | cpuinfo flag | resctrl directory |
//! |---------|--------------|-------------------|
//! | Cache Allocation (CAT) | `cat_l3` | `info/L3` |
//! | Memory Bandwidth Allocation (MBA) | `mba` | `info/MB` |

use std::path::Path;
use std::sync::OnceLock;

use serde::Serialize;

/// RDT features available on the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RdtFeatures {
    /// L3 cache allocation.
    pub cat: bool,
    /// Memory bandwidth allocation.
    pub mba: bool,
}

impl RdtFeatures {
    /// Returns whether at least one allocation feature is usable.
    #[must_use]
    pub const fn any(self) -> bool {
        self.cat || self.mba
    }
}

static FEATURES: OnceLock<RdtFeatures> = OnceLock::new();

/// Returns whether cache allocation is enabled.
pub fn is_cat_enabled() -> bool {
    features().cat
}

/// Returns whether memory bandwidth allocation is enabled.
pub fn is_mba_enabled() -> bool {
    features().mba
}

fn features() -> RdtFeatures {
    *FEATURES.get_or_init(probe)
}

/// Extracts the RDT-related CPU flags from `/proc/cpuinfo` content.
#[must_use]
pub fn parse_cpu_flags(cpuinfo: &str) -> RdtFeatures {
    let Some(flags) = cpuinfo
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "flags")
        .map(|(_, value)| value)
    else {
        return RdtFeatures::default();
    };
    let mut found = RdtFeatures::default();
    for flag in flags.split_whitespace() {
        match flag {
            "cat_l3" => found.cat = true,
            "mba" => found.mba = true,
            _ => {}
        }
    }
    found
}

/// Narrows CPU-advertised features to those the resctrl mount exposes.
#[must_use]
pub fn features_at(resctrl_root: &Path, cpu: RdtFeatures) -> RdtFeatures {
    let info = resctrl_root.join("info");
    RdtFeatures {
        cat: cpu.cat && info.join("L3").is_dir(),
        mba: cpu.mba && info.join("MB").is_dir(),
    }
}

#[cfg(target_os = "linux")]
fn probe() -> RdtFeatures {
    use hatch_common::constants::{CPUINFO_PATH, MOUNTINFO_PATH, RESCTRL_FS_TYPE};

    let cpu = std::fs::read_to_string(CPUINFO_PATH)
        .map(|content| parse_cpu_flags(&content))
        .unwrap_or_default();
    if !cpu.any() {
        tracing::debug!("cpu advertises no RDT allocation features");
        return RdtFeatures::default();
    }
    let root = match crate::mountinfo::read_mount_point(Path::new(MOUNTINFO_PATH), RESCTRL_FS_TYPE)
    {
        Ok(Some(root)) => root,
        Ok(None) => {
            tracing::debug!("resctrl not mounted");
            return RdtFeatures::default();
        }
        Err(e) => {
            tracing::debug!(error = %e, "cannot read mount table");
            return RdtFeatures::default();
        }
    };
    let found = features_at(&root, cpu);
    tracing::debug!(root = %root.display(), cat = found.cat, mba = found.mba, "intel rdt probed");
    found
}

#[cfg(not(target_os = "linux"))]
fn probe() -> RdtFeatures {
    RdtFeatures::default()
}
