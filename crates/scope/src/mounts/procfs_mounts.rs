#![forbid(unsafe_code)]

use crate::error::Error;
use crate::mounts::{DeviceKind, MountRecord};
use procfs::process::Process;
use std::path::Path;
use tracing::trace;

const NETWORK_FS: &[&str] = &[
    "nfs", "nfs4", "cifs", "smb3", "smbfs", "ncpfs", "afs", "9p", "ceph", "glusterfs", "sshfs",
    "fuse.sshfs", "davfs", "fuse.davfs2",
];

const OPTICAL_FS: &[&str] = &["iso9660", "udf"];

const SPECIAL_FS: &[&str] = &[
    "proc",
    "sysfs",
    "devtmpfs",
    "devpts",
    "securityfs",
    "cgroup",
    "cgroup2",
    "pstore",
    "bpf",
    "debugfs",
    "tracefs",
    "configfs",
    "fusectl",
    "mqueue",
    "hugetlbfs",
    "autofs",
    "binfmt_misc",
    "rpc_pipefs",
    "efivarfs",
    "selinuxfs",
    "nsfs",
    "ramfs",
];

/// Reads the mount table of the current process from procfs.
#[derive(Debug, Default)]
pub struct ProcfsMounts;

impl ProcfsMounts {
    pub fn read() -> Result<Vec<MountRecord>, Error> {
        let mut mounts = Vec::new();
        for info in Process::myself()?.mountinfo()? {
            let device = info.mount_source.unwrap_or_default();
            let removable = Self::is_removable_device(&device);
            let kind = Self::classify(&info.fs_type, removable);
            trace!(
                mount_point = %info.mount_point.display(),
                fs_type = %info.fs_type,
                ?kind,
                "mount"
            );
            mounts.push(MountRecord::new(device, info.mount_point, info.fs_type, kind));
        }
        Ok(mounts)
    }

    /// Best-effort device classification from the filesystem type.
    pub fn classify(fs_type: &str, removable: bool) -> DeviceKind {
        if SPECIAL_FS.contains(&fs_type) {
            DeviceKind::Special
        } else if NETWORK_FS.contains(&fs_type) {
            DeviceKind::Network
        } else if OPTICAL_FS.contains(&fs_type) {
            DeviceKind::Optical
        } else if removable {
            DeviceKind::Removable
        } else {
            DeviceKind::HardDisc
        }
    }

    fn is_removable_device(device: &str) -> bool {
        let Some(name) = device.strip_prefix("/dev/") else {
            return false;
        };
        let block = Path::new("/sys/class/block").join(name);
        // Partitions carry the flag on their parent disk.
        [block.join("removable"), block.join("../removable")]
            .iter()
            .find_map(|path| std::fs::read_to_string(path).ok())
            .is_some_and(|flag| flag.trim() == "1")
    }
}
