//! In-memory model of a bundle's `config.json`.
//!
//! Only the fields the creation pipeline interprets are typed: the process
//! section, the root filesystem, mounts, hostname, and annotations. Other
//! process fields and the whole `linux` section are carried through verbatim.

pub mod loader;
pub mod validator;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A container specification, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    /// Version of the runtime specification the document follows.
    #[serde(default)]
    pub oci_version: String,
    /// The container's init process.
    pub process: ProcessSpec,
    /// Root filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Root>,
    /// Hostname inside the UTS namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Additional mounts, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    /// Arbitrary metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Linux-specific configuration, passed through uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux: Option<Value>,
}

/// The process section of a specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpec {
    /// Attach a pseudo-terminal.
    #[serde(default)]
    pub terminal: bool,
    /// Working directory, absolute inside the container.
    #[serde(default)]
    pub cwd: String,
    /// Argument vector; `args[0]` is the executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment in `KEY=VALUE` form.
    #[serde(default)]
    pub env: Vec<String>,
    /// SELinux process label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selinux_label: Option<String>,
    /// Remaining process fields (`user`, `capabilities`, `rlimits`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessSpec {
    /// Returns the SELinux label if one is set to a non-empty value.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.selinux_label.as_deref().filter(|l| !l.is_empty())
    }
}

/// Root filesystem of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    /// Path to the rootfs, absolute or relative to the bundle.
    pub path: PathBuf,
    /// Mount the rootfs read-only.
    #[serde(default)]
    pub readonly: bool,
}

/// A mount entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Absolute destination inside the container.
    pub destination: PathBuf,
    /// Filesystem type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Device, directory, or pseudo-source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// `mount(8)`-style options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Mount {
    fn new(destination: &str, kind: &str, source: &str, options: &[&str]) -> Self {
        Self {
            destination: PathBuf::from(destination),
            kind: Some(kind.to_string()),
            source: Some(source.to_string()),
            options: options.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Specification {
    /// Returns a minimal runnable specification running `sh` in `rootfs`.
    #[must_use]
    pub fn example() -> Self {
        Self {
            oci_version: hatch_common::constants::OCI_VERSION.to_string(),
            process: ProcessSpec {
                terminal: true,
                cwd: "/".into(),
                args: vec!["sh".into()],
                env: vec![
                    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin".into(),
                    "TERM=xterm".into(),
                ],
                selinux_label: None,
                extra: Map::new(),
            },
            root: Some(Root {
                path: PathBuf::from("rootfs"),
                readonly: true,
            }),
            hostname: Some(hatch_common::constants::APP_NAME.into()),
            mounts: vec![
                Mount::new("/proc", "proc", "proc", &[]),
                Mount::new(
                    "/dev",
                    "tmpfs",
                    "tmpfs",
                    &["nosuid", "strictatime", "mode=755", "size=65536k"],
                ),
                Mount::new(
                    "/dev/pts",
                    "devpts",
                    "devpts",
                    &["nosuid", "noexec", "newinstance", "ptmxmode=0666", "mode=0620", "gid=5"],
                ),
                Mount::new(
                    "/dev/shm",
                    "tmpfs",
                    "shm",
                    &["nosuid", "noexec", "nodev", "mode=1777", "size=65536k"],
                ),
                Mount::new("/sys", "sysfs", "sysfs", &["nosuid", "noexec", "nodev", "ro"]),
            ],
            annotations: BTreeMap::new(),
            linux: Some(json!({
                "namespaces": [
                    { "type": "pid" },
                    { "type": "network" },
                    { "type": "ipc" },
                    { "type": "uts" },
                    { "type": "mount" }
                ],
                "maskedPaths": ["/proc/kcore", "/proc/keys", "/proc/timer_list"],
                "readonlyPaths": ["/proc/bus", "/proc/fs", "/proc/irq", "/proc/sys"]
            })),
        }
    }

    /// Returns [`Specification::example`] adjusted for an unprivileged user.
    ///
    /// Adds a user namespace mapping container root to `uid`/`gid`, drops the
    /// network namespace, bind-mounts `/sys`, and removes the `gid=5` devpts
    /// option that an unmapped group cannot satisfy.
    #[must_use]
    pub fn rootless_example(uid: u32, gid: u32) -> Self {
        let mut spec = Self::example();
        for mount in &mut spec.mounts {
            mount.options.retain(|o| o != "gid=5");
        }
        if let Some(sys) = spec
            .mounts
            .iter_mut()
            .find(|m| m.destination.as_os_str() == "/sys")
        {
            *sys = Mount::new("/sys", "none", "/sys", &["rbind", "nosuid", "noexec", "nodev", "ro"]);
        }
        spec.linux = Some(json!({
            "namespaces": [
                { "type": "pid" },
                { "type": "ipc" },
                { "type": "uts" },
                { "type": "mount" },
                { "type": "user" }
            ],
            "uidMappings": [{ "containerID": 0, "hostID": uid, "size": 1 }],
            "gidMappings": [{ "containerID": 0, "hostID": gid, "size": 1 }],
            "maskedPaths": ["/proc/kcore", "/proc/keys", "/proc/timer_list"],
            "readonlyPaths": ["/proc/bus", "/proc/fs", "/proc/irq", "/proc/sys"]
        }));
        spec
    }
}
