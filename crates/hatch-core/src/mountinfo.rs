//! Parsing of `/proc/self/mountinfo`.
//!
//! Used to locate pseudo-filesystems such as `selinuxfs` and `resctrl`
//! without relying on their conventional mount points.

use std::path::{Path, PathBuf};

use hatch_common::error::{HatchError, Result};

/// A single entry of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    /// Mount point relative to the process root.
    pub mount_point: PathBuf,
    /// Filesystem type, e.g. `ext4` or `resctrl`.
    pub fs_type: String,
}

/// Parses one mountinfo line.
///
/// Returns `None` for lines that do not follow the
/// `id parent maj:min root mount-point options [optional...] - type source super-options`
/// layout.
#[must_use]
pub fn parse_line(line: &str) -> Option<MountInfo> {
    let (fields, tail) = line.split_once(" - ")?;
    let mount_point = fields.split_whitespace().nth(4)?;
    let fs_type = tail.split_whitespace().next()?;
    Some(MountInfo {
        mount_point: PathBuf::from(unescape(mount_point)),
        fs_type: fs_type.to_string(),
    })
}

/// Returns the first mount point of the given filesystem type.
///
/// Malformed lines are skipped.
#[must_use]
pub fn find_mount_point(content: &str, fs_type: &str) -> Option<PathBuf> {
    content
        .lines()
        .filter_map(parse_line)
        .find(|m| m.fs_type == fs_type)
        .map(|m| m.mount_point)
}

/// Reads the mount table at `path` and looks up a filesystem type.
///
/// # Errors
///
/// Returns an error if the mount table cannot be read.
pub fn read_mount_point(path: &Path, fs_type: &str) -> Result<Option<PathBuf>> {
    let content = std::fs::read_to_string(path).map_err(|e| HatchError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let found = find_mount_point(&content, fs_type);
    tracing::trace!(fs_type, found = ?found, "mountinfo lookup");
    Ok(found)
}

/// Decodes the `\NNN` octal escapes the kernel uses for whitespace.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let decoded = bytes
                .get(i + 1..i + 4)
                .and_then(|digits| std::str::from_utf8(digits).ok())
                .filter(|digits| digits.bytes().all(|b| (b'0'..=b'7').contains(&b)))
                .and_then(|digits| u8::from_str_radix(digits, 8).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
