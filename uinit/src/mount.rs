//! Mount bootstrapper.
//!
//! Creates the mount point (idempotently) and mounts a scratch filesystem
//! before any boot step runs. Callers log failures and keep booting.

use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use nix::mount::{mount, MsFlags};
use serde::{Deserialize, Serialize};
use uinit_shared::constants::mount as mount_const;
use uinit_shared::errors::{UinitError, UinitResult};

/// One mount performed at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    pub source: String,
    pub target: PathBuf,
    pub fstype: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Default for MountSpec {
    /// tmpfs on /run.
    fn default() -> Self {
        Self {
            source: mount_const::SOURCE.to_string(),
            target: PathBuf::from(mount_const::TARGET),
            fstype: mount_const::FSTYPE.to_string(),
            options: mount_const::OPTIONS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Split mount options into kernel flags and filesystem data.
///
/// Flag words map onto `MsFlags`; anything else (`mode=755`, `size=64m`) is
/// passed through to the filesystem as comma-joined data.
pub fn parse_options(options: &[String]) -> (MsFlags, Option<String>) {
    let mut flags = MsFlags::empty();
    let mut data = Vec::new();

    for opt in options {
        match opt.as_str() {
            "defaults" => {}
            "rw" => flags.remove(MsFlags::MS_RDONLY),
            "ro" => flags.insert(MsFlags::MS_RDONLY),
            "nosuid" => flags.insert(MsFlags::MS_NOSUID),
            "suid" => flags.remove(MsFlags::MS_NOSUID),
            "nodev" => flags.insert(MsFlags::MS_NODEV),
            "dev" => flags.remove(MsFlags::MS_NODEV),
            "noexec" => flags.insert(MsFlags::MS_NOEXEC),
            "exec" => flags.remove(MsFlags::MS_NOEXEC),
            "noatime" => flags.insert(MsFlags::MS_NOATIME),
            "nodiratime" => flags.insert(MsFlags::MS_NODIRATIME),
            "relatime" => flags.insert(MsFlags::MS_RELATIME),
            "strictatime" => flags.insert(MsFlags::MS_STRICTATIME),
            "sync" => flags.insert(MsFlags::MS_SYNCHRONOUS),
            "remount" => flags.insert(MsFlags::MS_REMOUNT),
            "bind" => flags.insert(MsFlags::MS_BIND),
            "rbind" => flags.insert(MsFlags::MS_BIND | MsFlags::MS_REC),
            other => data.push(other),
        }
    }

    let data = if data.is_empty() {
        None
    } else {
        Some(data.join(","))
    };
    (flags, data)
}

/// Mounts scratch filesystems.
pub struct ScratchMount;

impl ScratchMount {
    /// Ensure the mount point exists, then mount.
    pub fn mount(spec: &MountSpec) -> UinitResult<()> {
        Self::ensure_mount_point(&spec.target)?;

        let (flags, data) = parse_options(&spec.options);
        tracing::debug!(
            "Mounting {} ({}) -> {} flags={:?} data={:?}",
            spec.source,
            spec.fstype,
            spec.target.display(),
            flags,
            data
        );

        mount(
            Some(spec.source.as_str()),
            spec.target.as_path(),
            Some(spec.fstype.as_str()),
            flags,
            data.as_deref(),
        )
        .map_err(|e| {
            UinitError::Mount(format!(
                "Failed to mount {} ({}) to {}: {}",
                spec.source,
                spec.fstype,
                spec.target.display(),
                e
            ))
        })
    }

    /// Create the mount point, ignoring "already exists".
    pub fn ensure_mount_point(target: &Path) -> UinitResult<()> {
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(mount_const::TARGET_MODE)
            .create(target)
            .map_err(|e| {
                UinitError::Storage(format!(
                    "Failed to create mount point {}: {}",
                    target.display(),
                    e
                ))
            })
    }
}
