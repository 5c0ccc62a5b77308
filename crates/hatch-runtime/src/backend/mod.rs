//! Container engine abstraction.
//!
//! The engine owns namespaces, cgroups, and process execution. This crate
//! only hands it a resolved [`ResourceStrategy`] and a converted
//! [`ContainerConfig`].

pub mod state_dir;

use hatch_common::error::Result;
use hatch_common::types::ContainerId;

use crate::factory::ResourceStrategy;
use crate::specconv::ContainerConfig;

/// An engine capable of creating containers.
///
/// Implementors are responsible for rejecting duplicate IDs and for
/// cleaning up anything they partially created on failure.
pub trait ContainerBackend: Send + Sync {
    /// Creates container `id` from `config` using `strategy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects or fails the creation.
    fn create(
        &self,
        strategy: &ResourceStrategy,
        id: &ContainerId,
        config: &ContainerConfig,
    ) -> Result<()>;
}

/// Returns the backend used when no other engine is configured.
#[must_use]
pub fn default_backend() -> Box<dyn ContainerBackend> {
    Box::new(state_dir::StateDirBackend)
}
