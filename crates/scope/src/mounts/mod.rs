#![forbid(unsafe_code)]

mod procfs_mounts;

pub use procfs_mounts::ProcfsMounts;

use std::path::{Path, PathBuf};

/// A mounted filesystem, already classified by device kind.
pub trait MountPoint {
    fn device_path(&self) -> &str;
    fn mount_point(&self) -> &Path;
    fn filesystem_type(&self) -> &str;
    fn is_hard_disc(&self) -> bool;
    fn is_network(&self) -> bool;
    fn is_optical(&self) -> bool;
    fn is_removable(&self) -> bool;
    /// Pseudo filesystems (`/proc`, `/sys`, ...) that must never be walked.
    fn is_special(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    HardDisc,
    Network,
    Optical,
    Removable,
    Special,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub device_path: String,
    pub mount_point: PathBuf,
    pub filesystem_type: String,
    pub kind: DeviceKind,
}

impl MountRecord {
    pub fn new(
        device_path: impl Into<String>,
        mount_point: impl Into<PathBuf>,
        filesystem_type: impl Into<String>,
        kind: DeviceKind,
    ) -> Self {
        Self {
            device_path: device_path.into(),
            mount_point: mount_point.into(),
            filesystem_type: filesystem_type.into(),
            kind,
        }
    }

    pub fn hard_disc(mount_point: impl Into<PathBuf>) -> Self {
        Self::new("/dev/sda1", mount_point, "ext4", DeviceKind::HardDisc)
    }

    pub fn network(mount_point: impl Into<PathBuf>) -> Self {
        Self::new("server:/export", mount_point, "nfs4", DeviceKind::Network)
    }

    pub fn optical(mount_point: impl Into<PathBuf>) -> Self {
        Self::new("/dev/sr0", mount_point, "iso9660", DeviceKind::Optical)
    }

    pub fn removable(mount_point: impl Into<PathBuf>) -> Self {
        Self::new("/dev/sdb1", mount_point, "vfat", DeviceKind::Removable)
    }

    pub fn special(mount_point: impl Into<PathBuf>, filesystem_type: impl Into<String>) -> Self {
        let filesystem_type = filesystem_type.into();
        Self::new(
            filesystem_type.clone(),
            mount_point,
            filesystem_type,
            DeviceKind::Special,
        )
    }
}

impl MountPoint for MountRecord {
    fn device_path(&self) -> &str {
        &self.device_path
    }

    fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn filesystem_type(&self) -> &str {
        &self.filesystem_type
    }

    fn is_hard_disc(&self) -> bool {
        self.kind == DeviceKind::HardDisc
    }

    fn is_network(&self) -> bool {
        self.kind == DeviceKind::Network
    }

    fn is_optical(&self) -> bool {
        self.kind == DeviceKind::Optical
    }

    fn is_removable(&self) -> bool {
        self.kind == DeviceKind::Removable
    }

    fn is_special(&self) -> bool {
        self.kind == DeviceKind::Special
    }
}
