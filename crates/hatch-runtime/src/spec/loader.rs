//! Specification file loading.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

use hatch_common::error::{HatchError, Result};
use hatch_core::host::HostProbe;

use super::Specification;

/// Loads a specification file and validates its process section.
///
/// A specification is never returned unvalidated. The file is closed on
/// every exit path.
///
/// # Errors
///
/// - [`HatchError::NotFound`] if `path` does not exist.
/// - [`HatchError::Io`] if the file cannot be opened or read for another reason.
/// - [`HatchError::MalformedSpec`] if the content is not a valid specification.
/// - [`HatchError::InvalidSpec`] if the process section violates an invariant.
pub fn load_spec(path: &Path, host: &dyn HostProbe) -> Result<Specification> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => HatchError::NotFound {
            kind: "specification file",
            id: path.display().to_string(),
        },
        _ => HatchError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let spec: Specification =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            if e.is_io() {
                HatchError::Io {
                    path: path.to_path_buf(),
                    source: e.into(),
                }
            } else {
                HatchError::MalformedSpec {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

    super::validator::validate_process(&spec.process, host)?;
    tracing::debug!(path = %path.display(), version = %spec.oci_version, "specification loaded");
    Ok(spec)
}
