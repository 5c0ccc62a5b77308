//! systemd cgroup delegation query.

use std::path::Path;
use std::sync::OnceLock;

static SUPPORTED: OnceLock<bool> = OnceLock::new();

/// Returns whether systemd can manage cgroups on behalf of the runtime.
///
/// Mirrors `sd_booted(3)`: the host runs systemd as init when
/// `/run/systemd/system` is a directory. Computed once per process.
pub fn cgroups_supported() -> bool {
    *SUPPORTED.get_or_init(|| {
        let booted = is_booted(Path::new(hatch_common::constants::SYSTEMD_RUNTIME_DIR));
        tracing::debug!(booted, "systemd probed");
        booted
    })
}

/// Returns whether `runtime_dir` marks a systemd-booted host.
#[must_use]
pub fn is_booted(runtime_dir: &Path) -> bool {
    cfg!(target_os = "linux") && runtime_dir.is_dir()
}
