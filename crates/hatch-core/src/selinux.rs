//! SELinux availability query.
//!
//! SELinux counts as enabled when `selinuxfs` is mounted and the calling
//! process is not running in the `kernel` context (which is what an
//! unlabeled, policy-less system reports).

use std::sync::OnceLock;

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Returns whether SELinux is enabled on this host.
///
/// The result is computed once per process.
pub fn is_enabled() -> bool {
    *ENABLED.get_or_init(probe)
}

/// Returns whether a raw `/proc/self/attr/current` value is the kernel context.
#[must_use]
pub fn is_kernel_context(raw: &str) -> bool {
    raw.trim_end_matches('\0').trim() == "kernel"
}

#[cfg(target_os = "linux")]
fn probe() -> bool {
    use std::path::Path;

    use hatch_common::constants::{MOUNTINFO_PATH, SELINUX_CURRENT_ATTR, SELINUX_FS_TYPE};

    let mount = match crate::mountinfo::read_mount_point(Path::new(MOUNTINFO_PATH), SELINUX_FS_TYPE)
    {
        Ok(Some(mount)) => mount,
        Ok(None) => {
            tracing::debug!("selinuxfs not mounted");
            return false;
        }
        Err(e) => {
            tracing::debug!(error = %e, "cannot read mount table");
            return false;
        }
    };
    let context = std::fs::read_to_string(SELINUX_CURRENT_ATTR).unwrap_or_default();
    let enabled = !is_kernel_context(&context);
    tracing::debug!(mount = %mount.display(), enabled, "selinux probed");
    enabled
}

#[cfg(not(target_os = "linux"))]
const fn probe() -> bool {
    false
}
