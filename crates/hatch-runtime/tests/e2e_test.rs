//! End-to-end integration tests for the Hatch runtime.
//!
//! These tests drive the full creation pipeline against a scratch bundle
//! and state root, with a fixed host report standing in for the machine:
//! 1. Load and validate `config.json`
//! 2. Convert it to an engine configuration
//! 3. Resolve the resource strategy
//! 4. Register the container with the state-directory backend
//! 5. Inspect, list, and delete recorded state

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::path::{Path, PathBuf};

use hatch_common::config::RuntimeConfig;
use hatch_common::error::HatchError;
use hatch_common::types::{CgroupDriver, ContainerId, ContainerState};
use hatch_core::host::HostReport;
use hatch_runtime::backend::state_dir::StateDirBackend;
use hatch_runtime::engine::Engine;
use hatch_runtime::spec::Specification;

struct Fixture {
    _dir: tempfile::TempDir,
    bundle: PathBuf,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("bundle");
        std::fs::create_dir_all(bundle.join("rootfs")).unwrap();
        let root = dir.path().join("state");
        Self {
            _dir: dir,
            bundle,
            root,
        }
    }

    fn write(&self, content: &str) -> PathBuf {
        let path = self.bundle.join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_spec(&self, spec: &Specification) -> PathBuf {
        self.write(&serde_json::to_string_pretty(spec).unwrap())
    }

    fn engine(&self, host: HostReport, systemd_cgroup: bool) -> Engine {
        let config = RuntimeConfig {
            root: self.root.clone(),
            systemd_cgroup,
            ..RuntimeConfig::default()
        };
        Engine::with_parts(config, Box::new(host), Box::new(StateDirBackend))
    }
}

fn id(s: &str) -> ContainerId {
    ContainerId::new(s)
}

// ── Creation ─────────────────────────────────────────────────────────

#[test]
fn create_records_state_in_root() {
    let fx = Fixture::new();
    let spec_path = fx.write_spec(&Specification::example());
    let engine = fx.engine(HostReport::default(), false);

    engine.create(&id("web"), &spec_path, false).unwrap();

    let entry = engine.state(&id("web")).unwrap();
    assert_eq!(entry.state, ContainerState::Created);
    assert_eq!(entry.cgroup_driver, CgroupDriver::Cgroupfs);
    assert_eq!(entry.bundle, fx.bundle);
    assert_eq!(entry.rootfs, fx.bundle.join("rootfs"));
    assert!(fx.root.join("web").join("state.json").is_file());
}

#[test]
fn rootless_creation_uses_rootless_driver() {
    let fx = Fixture::new();
    let (uid, gid) = (1000, 1000);
    let spec_path = fx.write_spec(&Specification::rootless_example(uid, gid));
    let host = HostReport {
        rootless_euid: true,
        ..HostReport::default()
    };
    let engine = fx.engine(host, false);

    engine.create(&id("rl"), &spec_path, true).unwrap();

    let entry = engine.state(&id("rl")).unwrap();
    assert_eq!(entry.cgroup_driver, CgroupDriver::RootlessCgroupfs);
    assert!(entry.rootless);
}

#[test]
fn duplicate_id_fails_and_keeps_first() {
    let fx = Fixture::new();
    let spec_path = fx.write_spec(&Specification::example());
    let engine = fx.engine(HostReport::default(), false);

    engine.create(&id("dup"), &spec_path, false).unwrap();
    let before = engine.state(&id("dup")).unwrap();
    let err = engine.create(&id("dup"), &spec_path, false).unwrap_err();

    assert!(matches!(err, HatchError::CreationFailed { .. }), "got: {err:?}");
    assert_eq!(engine.state(&id("dup")).unwrap(), before);
}

#[test]
fn annotations_are_recorded() {
    let fx = Fixture::new();
    let mut spec = Specification::example();
    let _ = spec
        .annotations
        .insert("org.example.owner".into(), "team-a".into());
    let spec_path = fx.write_spec(&spec);
    let engine = fx.engine(HostReport::default(), false);

    engine.create(&id("ann"), &spec_path, false).unwrap();

    let entry = engine.state(&id("ann")).unwrap();
    assert_eq!(
        entry.annotations.get("org.example.owner").map(String::as_str),
        Some("team-a")
    );
}

// ── Failures before the backend ──────────────────────────────────────

#[test]
fn missing_spec_is_not_found() {
    let fx = Fixture::new();
    let engine = fx.engine(HostReport::default(), false);

    let err = engine
        .create(&id("c"), &fx.bundle.join("config.json"), false)
        .unwrap_err();

    assert!(matches!(err, HatchError::NotFound { .. }), "got: {err:?}");
    assert!(!fx.root.exists());
}

#[test]
fn malformed_spec_is_rejected() {
    let fx = Fixture::new();
    let spec_path = fx.write("{ \"ociVersion\": ");
    let engine = fx.engine(HostReport::default(), false);

    let err = engine.create(&id("c"), &spec_path, false).unwrap_err();

    assert!(matches!(err, HatchError::MalformedSpec { .. }), "got: {err:?}");
}

#[test]
fn empty_args_are_invalid() {
    let fx = Fixture::new();
    let mut spec = Specification::example();
    spec.process.args.clear();
    let spec_path = fx.write_spec(&spec);
    let engine = fx.engine(HostReport::default(), false);

    let err = engine.create(&id("c"), &spec_path, false).unwrap_err();

    match err {
        HatchError::InvalidSpec { message } => assert_eq!(message, "args must not be empty"),
        other => panic!("expected InvalidSpec, got {other:?}"),
    }
    assert!(engine.list().unwrap().is_empty());
}

#[test]
fn selinux_label_requires_selinux() {
    let fx = Fixture::new();
    let mut spec = Specification::example();
    spec.process.selinux_label = Some("system_u:system_r:container_t:s0".into());
    let spec_path = fx.write_spec(&spec);

    let err = fx
        .engine(HostReport::default(), false)
        .create(&id("c"), &spec_path, false)
        .unwrap_err();
    assert!(matches!(err, HatchError::InvalidSpec { .. }));

    let host = HostReport {
        selinux: true,
        ..HostReport::default()
    };
    fx.engine(host, false).create(&id("c"), &spec_path, false).unwrap();
}

#[test]
fn systemd_without_support_is_unsupported() {
    let fx = Fixture::new();
    let spec_path = fx.write_spec(&Specification::example());
    let engine = fx.engine(HostReport::default(), true);

    let err = engine.create(&id("c"), &spec_path, false).unwrap_err();

    assert!(
        matches!(err, HatchError::UnsupportedConfiguration { .. }),
        "got: {err:?}"
    );
    assert!(!fx.root.join("c").exists());
}

#[test]
fn systemd_with_support_is_recorded() {
    let fx = Fixture::new();
    let spec_path = fx.write_spec(&Specification::example());
    let host = HostReport {
        systemd_cgroups: true,
        ..HostReport::default()
    };
    let engine = fx.engine(host, true);

    engine.create(&id("sd"), &spec_path, false).unwrap();

    assert_eq!(
        engine.state(&id("sd")).unwrap().cgroup_driver,
        CgroupDriver::Systemd
    );
}

#[test]
fn missing_rdt_does_not_block_creation() {
    let fx = Fixture::new();
    let spec_path = fx.write_spec(&Specification::example());
    let host = HostReport {
        rdt_cat: false,
        rdt_mba: false,
        ..HostReport::default()
    };

    fx.engine(host, false)
        .create(&id("nordt"), &spec_path, false)
        .unwrap();
}

#[test]
fn relative_mount_destination_is_a_conversion_error() {
    let fx = Fixture::new();
    let spec_path = fx.write(
        r#"{
            "ociVersion": "1.0.2",
            "process": { "cwd": "/", "args": ["sh"] },
            "root": { "path": "rootfs" },
            "mounts": [ { "destination": "proc", "type": "proc", "source": "proc" } ]
        }"#,
    );
    let engine = fx.engine(HostReport::default(), false);

    let err = engine.create(&id("c"), &spec_path, false).unwrap_err();

    assert!(matches!(err, HatchError::ConfigConversion { .. }), "got: {err:?}");
}

// ── State management ─────────────────────────────────────────────────

#[test]
fn list_and_delete_round_out_lifecycle() {
    let fx = Fixture::new();
    let spec_path = fx.write_spec(&Specification::example());
    let engine = fx.engine(HostReport::default(), false);

    for name in ["b", "a", "c"] {
        engine.create(&id(name), &spec_path, false).unwrap();
    }
    let ids: Vec<String> = engine
        .list()
        .unwrap()
        .into_iter()
        .map(|e| e.id.to_string())
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);

    engine.delete(&id("b")).unwrap();
    assert!(matches!(
        engine.state(&id("b")),
        Err(HatchError::NotFound { .. })
    ));
    assert_eq!(engine.list().unwrap().len(), 2);

    // The id is free again once deleted.
    engine.create(&id("b"), &spec_path, false).unwrap();
}

#[test]
fn empty_state_root_is_a_path_error() {
    let fx = Fixture::new();
    let spec_path = fx.write_spec(&Specification::example());
    let config = RuntimeConfig {
        root: PathBuf::from(""),
        ..RuntimeConfig::default()
    };
    let engine = Engine::with_parts(config, Box::new(HostReport::default()), Box::new(StateDirBackend));

    let err = engine.create(&id("c"), &spec_path, false).unwrap_err();

    assert!(matches!(err, HatchError::PathError { .. }), "got: {err:?}");
    assert!(Path::new(&fx.bundle).exists());
}
