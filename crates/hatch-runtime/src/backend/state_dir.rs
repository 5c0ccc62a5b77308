//! Backend that registers containers in the state root directory.
//!
//! Each container gets `<root>/<id>/state.json`. The exclusive creation of
//! `<root>/<id>` is what guarantees an ID is never created twice, even by
//! concurrent `hatch` invocations.

use std::fs::DirBuilder;
use std::io::ErrorKind;
use std::os::unix::fs::DirBuilderExt;

use hatch_common::error::{HatchError, Result};
use hatch_common::types::ContainerId;

use super::ContainerBackend;
use crate::factory::ResourceStrategy;
use crate::specconv::ContainerConfig;
use crate::state::{self, StateEntry};

/// Backend that records created containers on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateDirBackend;

impl ContainerBackend for StateDirBackend {
    fn create(
        &self,
        strategy: &ResourceStrategy,
        id: &ContainerId,
        config: &ContainerConfig,
    ) -> Result<()> {
        if !id.is_valid() {
            return Err(HatchError::CreationFailed {
                id: id.to_string(),
                reason: "invalid container id format".into(),
            });
        }

        let root = strategy.root();
        DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(root)
            .map_err(|e| HatchError::Io {
                path: root.to_path_buf(),
                source: e,
            })?;

        let dir = root.join(id.as_str());
        DirBuilder::new()
            .mode(0o711)
            .create(&dir)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => HatchError::CreationFailed {
                    id: id.to_string(),
                    reason: "container with id exists".into(),
                },
                _ => HatchError::Io {
                    path: dir.clone(),
                    source: e,
                },
            })?;

        let entry = StateEntry::created(id.clone(), strategy, config);
        if let Err(e) = state::save_state(root, &entry) {
            if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                tracing::warn!(path = %dir.display(), error = %cleanup, "failed to remove container directory");
            }
            return Err(e);
        }
        tracing::info!(id = %id, path = %dir.display(), "container registered");
        Ok(())
    }
}
