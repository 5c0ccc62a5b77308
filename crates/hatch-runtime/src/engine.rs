//! Runtime engine that orchestrates container creation.

use std::path::{Path, PathBuf};

use hatch_common::config::RuntimeConfig;
use hatch_common::error::{HatchError, Result};
use hatch_common::types::ContainerId;
use hatch_core::host::{HostProbe, SystemHost};

use crate::backend::{self, ContainerBackend};
use crate::factory::{self, FactoryOptions};
use crate::spec::loader;
use crate::specconv::{self, CreateOpts};
use crate::state::{self, StateEntry};

/// The runtime engine that coordinates container operations.
///
/// Holds immutable configuration plus shared host and backend handles, so
/// one engine can serve concurrent creations of different IDs.
pub struct Engine {
    config: RuntimeConfig,
    host: Box<dyn HostProbe>,
    backend: Box<dyn ContainerBackend>,
}

impl Engine {
    /// Creates an engine probing the real host with the default backend.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_parts(config, Box::new(SystemHost), backend::default_backend())
    }

    /// Creates an engine from explicit host and backend implementations.
    #[must_use]
    pub fn with_parts(
        config: RuntimeConfig,
        host: Box<dyn HostProbe>,
        backend: Box<dyn ContainerBackend>,
    ) -> Self {
        Self {
            config,
            host,
            backend,
        }
    }

    /// Creates container `id` from the specification at `spec_path`.
    ///
    /// The specification's directory is the bundle: a relative rootfs is
    /// resolved against it. Nothing is rolled back here; the backend cleans
    /// up after its own failures.
    ///
    /// # Errors
    ///
    /// Returns the first failure of loading, validation, conversion,
    /// strategy resolution, or backend creation.
    pub fn create(&self, id: &ContainerId, spec_path: &Path, rootless: bool) -> Result<()> {
        let spec = loader::load_spec(spec_path, self.host.as_ref())?;
        let bundle = bundle_dir(spec_path)?;

        let config = specconv::create_container_config(&CreateOpts {
            cgroup_name: id.as_str(),
            use_systemd_cgroup: self.config.systemd_cgroup,
            no_pivot_root: self.config.no_pivot_root,
            no_new_keyring: self.config.no_new_keyring,
            spec: &spec,
            bundle: &bundle,
            rootless_euid: self.host.rootless_euid(),
            rootless_cgroups: rootless,
        })?;

        let strategy = factory::resolve_strategy(
            &FactoryOptions {
                root: &self.config.root,
                rootless,
                systemd_cgroup: self.config.systemd_cgroup,
                criu: &self.config.criu,
            },
            self.host.as_ref(),
        )?;

        strategy.create(self.backend.as_ref(), id, &config)?;
        tracing::info!(id = %id, bundle = %bundle.display(), "container created");
        Ok(())
    }

    /// Returns the recorded state of container `id`.
    ///
    /// # Errors
    ///
    /// Returns [`HatchError::NotFound`] if no such container was created.
    pub fn state(&self, id: &ContainerId) -> Result<StateEntry> {
        state::load_state(&self.config.root, id)
    }

    /// Lists all recorded containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the state root cannot be read.
    pub fn list(&self) -> Result<Vec<StateEntry>> {
        state::list_states(&self.config.root)
    }

    /// Deletes the recorded state of container `id`.
    ///
    /// # Errors
    ///
    /// Returns [`HatchError::NotFound`] if no such container was created.
    pub fn delete(&self, id: &ContainerId) -> Result<()> {
        state::remove_state(&self.config.root, id)
    }

    /// Returns the runtime configuration.
    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns the host probe.
    #[must_use]
    pub fn host(&self) -> &dyn HostProbe {
        self.host.as_ref()
    }
}

/// Absolute directory containing the specification file.
fn bundle_dir(spec_path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(spec_path).map_err(|e| HatchError::PathError {
        path: spec_path.to_path_buf(),
        source: e,
    })?;
    Ok(absolute
        .parent()
        .map_or_else(|| PathBuf::from("/"), Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use hatch_common::types::CgroupDriver;
    use hatch_core::host::HostReport;

    use super::*;
    use crate::factory::ResourceStrategy;
    use crate::spec::Specification;
    use crate::specconv::ContainerConfig;

    type Calls = Arc<Mutex<Vec<(ResourceStrategy, ContainerId, ContainerConfig)>>>;

    struct RecordingBackend {
        calls: Calls,
        fail: bool,
    }

    impl ContainerBackend for RecordingBackend {
        fn create(
            &self,
            strategy: &ResourceStrategy,
            id: &ContainerId,
            config: &ContainerConfig,
        ) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((strategy.clone(), id.clone(), config.clone()));
            if self.fail {
                return Err(HatchError::Io {
                    path: PathBuf::from("/dev/null"),
                    source: std::io::Error::other("engine exploded"),
                });
            }
            Ok(())
        }
    }

    fn engine(root: &Path, host: HostReport, systemd: bool, fail: bool) -> (Engine, Calls) {
        let calls = Calls::default();
        let config = RuntimeConfig {
            root: root.to_path_buf(),
            systemd_cgroup: systemd,
            ..RuntimeConfig::default()
        };
        let backend = RecordingBackend {
            calls: Arc::clone(&calls),
            fail,
        };
        (
            Engine::with_parts(config, Box::new(host), Box::new(backend)),
            calls,
        )
    }

    fn write_spec(dir: &Path, spec: &Specification) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, serde_json::to_vec(spec).unwrap()).unwrap();
        path
    }

    #[test]
    fn create_hands_converted_config_to_backend() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = write_spec(dir.path(), &Specification::example());
        let host = HostReport {
            rootless_euid: true,
            ..HostReport::default()
        };
        let (engine, calls) = engine(&dir.path().join("state"), host, false, false);

        engine
            .create(&ContainerId::new("web"), &spec_path, true)
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (strategy, id, config) = &calls[0];
        assert_eq!(id.as_str(), "web");
        assert_eq!(strategy.cgroup_driver(), CgroupDriver::RootlessCgroupfs);
        assert_eq!(config.cgroup_name, "web");
        assert_eq!(config.rootfs, dir.path().join("rootfs"));
        assert_eq!(config.bundle, dir.path());
        assert!(config.rootless_euid);
        assert!(config.rootless_cgroups);
        assert!(!config.use_systemd_cgroup);
    }

    #[test]
    fn invalid_spec_never_reaches_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = Specification::example();
        spec.process.cwd = "relative".into();
        let spec_path = write_spec(dir.path(), &spec);
        let (engine, calls) = engine(dir.path(), HostReport::default(), false, false);

        let err = engine
            .create(&ContainerId::new("c"), &spec_path, false)
            .unwrap_err();
        assert!(matches!(err, HatchError::InvalidSpec { .. }), "got: {err:?}");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = Specification::example();
        spec.root = None;
        let spec_path = write_spec(dir.path(), &spec);
        let (engine, calls) = engine(dir.path(), HostReport::default(), false, false);

        let err = engine
            .create(&ContainerId::new("c"), &spec_path, false)
            .unwrap_err();
        assert!(matches!(err, HatchError::ConfigConversion { .. }), "got: {err:?}");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn systemd_flag_flows_into_conversion_and_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = write_spec(dir.path(), &Specification::example());
        let host = HostReport {
            systemd_cgroups: true,
            ..HostReport::default()
        };
        let (engine, calls) = engine(dir.path(), host, true, false);

        engine.create(&ContainerId::new("s"), &spec_path, false).unwrap();

        let calls = calls.lock().unwrap();
        let (strategy, _, config) = &calls[0];
        assert_eq!(strategy.cgroup_driver(), CgroupDriver::Systemd);
        assert!(config.use_systemd_cgroup);
    }

    #[test]
    fn unsupported_systemd_stops_before_backend() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = write_spec(dir.path(), &Specification::example());
        let (engine, calls) = engine(dir.path(), HostReport::default(), true, false);

        let err = engine
            .create(&ContainerId::new("s"), &spec_path, false)
            .unwrap_err();
        assert!(matches!(err, HatchError::UnsupportedConfiguration { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn backend_failure_is_creation_failed() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = write_spec(dir.path(), &Specification::example());
        let (engine, calls) = engine(dir.path(), HostReport::default(), false, true);

        let err = engine
            .create(&ContainerId::new("boom"), &spec_path, false)
            .unwrap_err();
        match err {
            HatchError::CreationFailed { id, reason } => {
                assert_eq!(id, "boom");
                assert!(reason.contains("engine exploded"), "reason: {reason}");
            }
            other => panic!("expected CreationFailed, got {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn bundle_dir_of_relative_spec_is_absolute() {
        let bundle = bundle_dir(Path::new("config.json")).unwrap();
        assert!(bundle.is_absolute());
    }
}
