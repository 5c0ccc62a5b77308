//! Conversion of a [`Specification`] into an engine-ready [`ContainerConfig`].
//!
//! Conversion is a pure data transformation: it never touches the
//! filesystem or the kernel. Relative rootfs paths are joined onto the
//! bundle directory rather than canonicalized.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hatch_common::error::{HatchError, Result};
use nix::mount::MsFlags;
use serde_json::Value;

use crate::spec::{Mount, Specification};

/// Inputs to [`create_container_config`]. Every option is explicit.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy)]
pub struct CreateOpts<'a> {
    /// Name of the container's cgroup (the container ID).
    pub cgroup_name: &'a str,
    /// Delegate cgroup management to systemd.
    pub use_systemd_cgroup: bool,
    /// Do not use `pivot_root(2)` to enter the rootfs.
    pub no_pivot_root: bool,
    /// Do not create a new session keyring.
    pub no_new_keyring: bool,
    /// The loaded, validated specification.
    pub spec: &'a Specification,
    /// Directory relative rootfs paths are resolved against.
    pub bundle: &'a Path,
    /// The effective user is unprivileged on the host.
    pub rootless_euid: bool,
    /// Cgroup management must tolerate missing privileges.
    pub rootless_cgroups: bool,
}

/// Engine-ready container configuration.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    /// Cgroup name.
    pub cgroup_name: String,
    /// Delegate cgroup management to systemd.
    pub use_systemd_cgroup: bool,
    /// Do not use `pivot_root(2)`.
    pub no_pivot_root: bool,
    /// Do not create a new session keyring.
    pub no_new_keyring: bool,
    /// The effective user is unprivileged on the host.
    pub rootless_euid: bool,
    /// Cgroup management must tolerate missing privileges.
    pub rootless_cgroups: bool,
    /// Bundle directory the specification was loaded from.
    pub bundle: PathBuf,
    /// Absolute path of the root filesystem.
    pub rootfs: PathBuf,
    /// Mount the rootfs read-only.
    pub readonly_rootfs: bool,
    /// Hostname inside the UTS namespace.
    pub hostname: Option<String>,
    /// Init process settings.
    pub process: ProcessConfig,
    /// Mounts in application order.
    pub mounts: Vec<MountConfig>,
    /// Specification annotations.
    pub annotations: BTreeMap<String, String>,
    /// Linux section, passed through to the engine.
    pub linux: Option<Value>,
}

/// Init process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Argument vector.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Environment as key/value pairs, in specification order.
    pub env: Vec<(String, String)>,
    /// Attach a pseudo-terminal.
    pub terminal: bool,
    /// SELinux process label.
    pub selinux_label: Option<String>,
}

/// A mount translated to `mount(2)` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    /// Mount source.
    pub source: Option<String>,
    /// Absolute destination inside the container.
    pub destination: PathBuf,
    /// Filesystem type.
    pub kind: Option<String>,
    /// Flags passed to the initial mount.
    pub flags: MsFlags,
    /// Propagation changes applied after mounting, in order.
    pub propagation: Vec<MsFlags>,
    /// Filesystem-specific data string.
    pub data: String,
}

/// Converts a specification into a [`ContainerConfig`].
///
/// # Errors
///
/// Returns [`HatchError::ConfigConversion`] if the root filesystem is
/// missing, an environment entry is not `KEY=VALUE`, a mount destination is
/// not absolute, or the linux section is not an object.
pub fn create_container_config(opts: &CreateOpts<'_>) -> Result<ContainerConfig> {
    let spec = opts.spec;
    let root = spec
        .root
        .as_ref()
        .ok_or_else(|| HatchError::conversion("root must be specified"))?;
    if root.path.as_os_str().is_empty() {
        return Err(HatchError::conversion("root.path must not be empty"));
    }
    let rootfs = if root.path.is_absolute() {
        root.path.clone()
    } else {
        opts.bundle.join(&root.path)
    };

    if let Some(linux) = &spec.linux {
        if !linux.is_object() {
            return Err(HatchError::conversion("linux section must be an object"));
        }
    }

    let config = ContainerConfig {
        cgroup_name: opts.cgroup_name.to_string(),
        use_systemd_cgroup: opts.use_systemd_cgroup,
        no_pivot_root: opts.no_pivot_root,
        no_new_keyring: opts.no_new_keyring,
        rootless_euid: opts.rootless_euid,
        rootless_cgroups: opts.rootless_cgroups,
        bundle: opts.bundle.to_path_buf(),
        rootfs,
        readonly_rootfs: root.readonly,
        hostname: spec.hostname.clone(),
        process: ProcessConfig {
            args: spec.process.args.clone(),
            cwd: PathBuf::from(&spec.process.cwd),
            env: parse_env(&spec.process.env)?,
            terminal: spec.process.terminal,
            selinux_label: spec.process.label().map(ToString::to_string),
        },
        mounts: spec.mounts.iter().map(convert_mount).collect::<Result<_>>()?,
        annotations: spec.annotations.clone(),
        linux: spec.linux.clone(),
    };
    tracing::debug!(
        cgroup = %config.cgroup_name,
        rootfs = %config.rootfs.display(),
        mounts = config.mounts.len(),
        "specification converted"
    );
    Ok(config)
}

fn parse_env(env: &[String]) -> Result<Vec<(String, String)>> {
    env.iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(HatchError::conversion(format!(
                "process.env entry \"{entry}\" is not in KEY=VALUE form"
            ))),
        })
        .collect()
}

fn convert_mount(mount: &Mount) -> Result<MountConfig> {
    if mount.destination.as_os_str().is_empty() {
        return Err(HatchError::conversion("mount destination must not be empty"));
    }
    if !mount.destination.is_absolute() {
        return Err(HatchError::conversion(format!(
            "mount destination {} is not absolute",
            mount.destination.display()
        )));
    }
    let (mut flags, propagation, data) = parse_mount_options(&mount.options);
    if mount.kind.as_deref() == Some("bind") {
        flags.insert(MsFlags::MS_BIND);
    }
    Ok(MountConfig {
        source: mount.source.clone(),
        destination: mount.destination.clone(),
        kind: mount.kind.clone(),
        flags,
        propagation,
        data,
    })
}

/// Splits `mount(8)` options into flags, propagation changes, and data.
///
/// Later options override earlier ones, so `ro,rw` leaves the mount writable.
#[must_use]
pub fn parse_mount_options(options: &[String]) -> (MsFlags, Vec<MsFlags>, String) {
    let mut flags = MsFlags::empty();
    let mut propagation = Vec::new();
    let mut data = Vec::new();
    for option in options {
        if let Some((clear, flag)) = mount_flag(option) {
            if clear {
                flags.remove(flag);
            } else {
                flags.insert(flag);
            }
        } else if let Some(flag) = propagation_flag(option) {
            propagation.push(flag);
        } else {
            data.push(option.as_str());
        }
    }
    (flags, propagation, data.join(","))
}

/// Maps an option to `(clears, flag)`.
fn mount_flag(option: &str) -> Option<(bool, MsFlags)> {
    let entry = match option {
        "ro" => (false, MsFlags::MS_RDONLY),
        "rw" => (true, MsFlags::MS_RDONLY),
        "nosuid" => (false, MsFlags::MS_NOSUID),
        "suid" => (true, MsFlags::MS_NOSUID),
        "nodev" => (false, MsFlags::MS_NODEV),
        "dev" => (true, MsFlags::MS_NODEV),
        "noexec" => (false, MsFlags::MS_NOEXEC),
        "exec" => (true, MsFlags::MS_NOEXEC),
        "sync" => (false, MsFlags::MS_SYNCHRONOUS),
        "async" => (true, MsFlags::MS_SYNCHRONOUS),
        "remount" => (false, MsFlags::MS_REMOUNT),
        "mand" => (false, MsFlags::MS_MANDLOCK),
        "nomand" => (true, MsFlags::MS_MANDLOCK),
        "noatime" => (false, MsFlags::MS_NOATIME),
        "atime" => (true, MsFlags::MS_NOATIME),
        "nodiratime" => (false, MsFlags::MS_NODIRATIME),
        "diratime" => (true, MsFlags::MS_NODIRATIME),
        "bind" => (false, MsFlags::MS_BIND),
        "rbind" => (false, MsFlags::MS_BIND | MsFlags::MS_REC),
        "relatime" => (false, MsFlags::MS_RELATIME),
        "norelatime" => (true, MsFlags::MS_RELATIME),
        "strictatime" => (false, MsFlags::MS_STRICTATIME),
        "nostrictatime" => (true, MsFlags::MS_STRICTATIME),
        _ => return None,
    };
    Some(entry)
}

fn propagation_flag(option: &str) -> Option<MsFlags> {
    let flag = match option {
        "private" => MsFlags::MS_PRIVATE,
        "rprivate" => MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        "shared" => MsFlags::MS_SHARED,
        "rshared" => MsFlags::MS_SHARED | MsFlags::MS_REC,
        "slave" => MsFlags::MS_SLAVE,
        "rslave" => MsFlags::MS_SLAVE | MsFlags::MS_REC,
        "unbindable" => MsFlags::MS_UNBINDABLE,
        "runbindable" => MsFlags::MS_UNBINDABLE | MsFlags::MS_REC,
        _ => return None,
    };
    Some(flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Root;

    fn opts<'a>(spec: &'a Specification, bundle: &'a Path) -> CreateOpts<'a> {
        CreateOpts {
            cgroup_name: "web",
            use_systemd_cgroup: false,
            no_pivot_root: false,
            no_new_keyring: false,
            spec,
            bundle,
            rootless_euid: false,
            rootless_cgroups: false,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn conversion_message(result: Result<ContainerConfig>) -> String {
        match result {
            Err(HatchError::ConfigConversion { message }) => message,
            other => panic!("expected ConfigConversion, got {other:?}"),
        }
    }

    #[test]
    fn example_converts_with_bundle_relative_rootfs() {
        let spec = Specification::example();
        let config = create_container_config(&opts(&spec, Path::new("/bundles/web"))).unwrap();
        assert_eq!(config.rootfs, PathBuf::from("/bundles/web/rootfs"));
        assert!(config.readonly_rootfs);
        assert_eq!(config.cgroup_name, "web");
        assert_eq!(config.process.cwd, PathBuf::from("/"));
        assert_eq!(config.mounts.len(), spec.mounts.len());
        assert_eq!(config.hostname.as_deref(), Some("hatch"));
    }

    #[test]
    fn absolute_rootfs_is_kept() {
        let mut spec = Specification::example();
        spec.root = Some(Root {
            path: PathBuf::from("/srv/rootfs"),
            readonly: false,
        });
        let config = create_container_config(&opts(&spec, Path::new("/bundles/web"))).unwrap();
        assert_eq!(config.rootfs, PathBuf::from("/srv/rootfs"));
    }

    #[test]
    fn options_are_carried_verbatim() {
        let spec = Specification::example();
        let bundle = Path::new("/b");
        let config = create_container_config(&CreateOpts {
            use_systemd_cgroup: true,
            no_pivot_root: true,
            no_new_keyring: true,
            rootless_euid: true,
            rootless_cgroups: true,
            ..opts(&spec, bundle)
        })
        .unwrap();
        assert!(config.use_systemd_cgroup);
        assert!(config.no_pivot_root);
        assert!(config.no_new_keyring);
        assert!(config.rootless_euid);
        assert!(config.rootless_cgroups);
    }

    #[test]
    fn missing_root_fails() {
        let mut spec = Specification::example();
        spec.root = None;
        let message = conversion_message(create_container_config(&opts(&spec, Path::new("/b"))));
        assert_eq!(message, "root must be specified");
    }

    #[test]
    fn env_is_split_on_first_equals() {
        let mut spec = Specification::example();
        spec.process.env = strings(&["A=1", "B=x=y", "EMPTY="]);
        let config = create_container_config(&opts(&spec, Path::new("/b"))).unwrap();
        assert_eq!(
            config.process.env,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "x=y".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn env_without_equals_fails() {
        let mut spec = Specification::example();
        spec.process.env = strings(&["PATH=/bin", "BROKEN"]);
        let message = conversion_message(create_container_config(&opts(&spec, Path::new("/b"))));
        assert!(message.contains("BROKEN"), "got: {message}");
    }

    #[test]
    fn relative_mount_destination_fails() {
        let mut spec = Specification::example();
        spec.mounts.push(Mount {
            destination: PathBuf::from("data"),
            kind: Some("tmpfs".into()),
            source: Some("tmpfs".into()),
            options: Vec::new(),
        });
        let message = conversion_message(create_container_config(&opts(&spec, Path::new("/b"))));
        assert!(message.contains("not absolute"), "got: {message}");
    }

    #[test]
    fn non_object_linux_section_fails() {
        let mut spec = Specification::example();
        spec.linux = Some(Value::from(5));
        let message = conversion_message(create_container_config(&opts(&spec, Path::new("/b"))));
        assert_eq!(message, "linux section must be an object");
    }

    #[test]
    fn bind_type_implies_bind_flag() {
        let mut spec = Specification::example();
        spec.mounts = vec![Mount {
            destination: PathBuf::from("/data"),
            kind: Some("bind".into()),
            source: Some("/srv/data".into()),
            options: strings(&["ro"]),
        }];
        let config = create_container_config(&opts(&spec, Path::new("/b"))).unwrap();
        assert_eq!(config.mounts[0].flags, MsFlags::MS_BIND | MsFlags::MS_RDONLY);
    }

    #[test]
    fn mount_options_split_into_flags_propagation_and_data() {
        let (flags, propagation, data) =
            parse_mount_options(&strings(&["nosuid", "rbind", "rslave", "mode=755", "size=64k"]));
        assert_eq!(flags, MsFlags::MS_NOSUID | MsFlags::MS_BIND | MsFlags::MS_REC);
        assert_eq!(propagation, vec![MsFlags::MS_SLAVE | MsFlags::MS_REC]);
        assert_eq!(data, "mode=755,size=64k");
    }

    #[test]
    fn later_mount_options_override_earlier_ones() {
        let (flags, _, _) = parse_mount_options(&strings(&["ro", "noexec", "rw"]));
        assert_eq!(flags, MsFlags::MS_NOEXEC);
    }
}
