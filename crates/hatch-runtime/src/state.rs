//! Persistent state records.
//!
//! Maintains one JSON record per container under the state root,
//! enabling daemon-less inspection of created containers.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use hatch_common::constants::STATE_FILE_NAME;
use hatch_common::error::{HatchError, Result};
use hatch_common::types::{CgroupDriver, ContainerId, ContainerState};
use serde::{Deserialize, Serialize};

use crate::factory::ResourceStrategy;
use crate::specconv::ContainerConfig;

/// Persistent record of a container's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Container identifier.
    pub id: ContainerId,
    /// Current lifecycle state.
    pub state: ContainerState,
    /// Bundle directory.
    pub bundle: PathBuf,
    /// Root filesystem path.
    pub rootfs: PathBuf,
    /// Cgroup driver the container was created with.
    pub cgroup_driver: CgroupDriver,
    /// Created by an unprivileged user.
    pub rootless: bool,
    /// Specification annotations.
    pub annotations: BTreeMap<String, String>,
    /// RFC 3339 timestamp of creation.
    pub created_at: String,
}

impl StateEntry {
    /// Builds the record of a freshly created container.
    #[must_use]
    pub fn created(id: ContainerId, strategy: &ResourceStrategy, config: &ContainerConfig) -> Self {
        Self {
            id,
            state: ContainerState::Created,
            bundle: config.bundle.clone(),
            rootfs: config.rootfs.clone(),
            cgroup_driver: strategy.cgroup_driver(),
            rootless: config.rootless_euid,
            annotations: config.annotations.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Returns the state file path of container `id`.
#[must_use]
pub fn state_path(root: &Path, id: &ContainerId) -> PathBuf {
    root.join(id.as_str()).join(STATE_FILE_NAME)
}

/// Loads the state record of container `id`.
///
/// # Errors
///
/// Returns [`HatchError::NotFound`] if the container has no record, or an
/// error if the file cannot be read or parsed.
pub fn load_state(root: &Path, id: &ContainerId) -> Result<StateEntry> {
    if !id.is_valid() {
        return Err(not_found(id));
    }
    let path = state_path(root, id);
    tracing::debug!(path = %path.display(), "loading state");
    let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => not_found(id),
        _ => HatchError::Io {
            path: path.clone(),
            source: e,
        },
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Persists a state record, replacing any previous one atomically.
///
/// The container directory must already exist.
///
/// # Errors
///
/// Returns an error if the record cannot be encoded or written.
pub fn save_state(root: &Path, entry: &StateEntry) -> Result<()> {
    let path = state_path(root, &entry.id);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(entry)?;
    std::fs::write(&tmp, json).map_err(|e| HatchError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, &path).map_err(|e| HatchError::Io {
        path: path.clone(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}

/// Lists every container recorded under `root`, sorted by ID.
///
/// A missing root means no containers. Directories without a state file
/// are skipped.
///
/// # Errors
///
/// Returns an error if the root cannot be read or a record is corrupt.
pub fn list_states(root: &Path) -> Result<Vec<StateEntry>> {
    let dir = match std::fs::read_dir(root) {
        Ok(dir) => dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(HatchError::Io {
                path: root.to_path_buf(),
                source: e,
            });
        }
    };
    let mut entries = Vec::new();
    for item in dir {
        let item = item.map_err(|e| HatchError::Io {
            path: root.to_path_buf(),
            source: e,
        })?;
        let Some(name) = item.file_name().to_str().map(ContainerId::new) else {
            continue;
        };
        match load_state(root, &name) {
            Ok(entry) => entries.push(entry),
            Err(HatchError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    entries.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    Ok(entries)
}

/// Removes the record and directory of container `id`.
///
/// # Errors
///
/// Returns [`HatchError::NotFound`] if the container has no record, or an
/// error if the directory cannot be removed.
pub fn remove_state(root: &Path, id: &ContainerId) -> Result<()> {
    let _ = load_state(root, id)?;
    let dir = root.join(id.as_str());
    std::fs::remove_dir_all(&dir).map_err(|e| HatchError::Io {
        path: dir.clone(),
        source: e,
    })?;
    tracing::info!(id = %id, "container state removed");
    Ok(())
}

fn not_found(id: &ContainerId) -> HatchError {
    HatchError::NotFound {
        kind: "container",
        id: id.to_string(),
    }
}
