//! Process section validation.
//!
//! Runs before any resource is created so a bad specification is reported
//! without side effects.

use std::path::Path;

use hatch_common::error::{HatchError, Result};
use hatch_core::host::HostProbe;

use super::ProcessSpec;

/// Validates a process section.
///
/// # Checks performed
///
/// 1. `cwd` is not empty.
/// 2. `cwd` is an absolute path.
/// 3. `args` is not empty.
/// 4. A non-empty SELinux label requires SELinux to be enabled on the host.
///
/// Checks run in this order and the first violation is reported.
///
/// # Errors
///
/// Returns [`HatchError::InvalidSpec`] naming the violated rule.
pub fn validate_process(process: &ProcessSpec, host: &dyn HostProbe) -> Result<()> {
    if process.cwd.is_empty() {
        return Err(HatchError::invalid_spec("Cwd must not be empty"));
    }
    if !Path::new(&process.cwd).is_absolute() {
        return Err(HatchError::invalid_spec("Cwd must be absolute"));
    }
    if process.args.is_empty() {
        return Err(HatchError::invalid_spec("args must not be empty"));
    }
    if process.label().is_some() && !host.selinux_enabled() {
        return Err(HatchError::invalid_spec("label set but subsystem disabled"));
    }
    Ok(())
}
