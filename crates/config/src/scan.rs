#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Scan {
    /// Absolute paths that must be scanned regardless of the device they
    /// live on. An explicit include is allowed to "drill through" a shorter
    /// exclusion: including `/home/user/work` while excluding `/home/` still
    /// scans everything under `/home/user/work`.
    ///
    /// # Note
    ///
    /// When no path is included here and no mount matches one of the device
    /// kind flags below, the whole filesystem starting at `/` is scanned.
    pub include_paths: Vec<PathBuf>,

    /// Exclusion rules in the legacy exclusion grammar. The shape of each
    /// string decides how it matches:
    ///
    /// - `/var/cache/` (absolute, trailing separator) excludes the directory
    ///   and everything below it.
    /// - `/etc/shadow` (absolute) excludes that exact path, and everything
    ///   below it should it turn out to be a directory.
    /// - `core` (no separator) excludes every file named `core`.
    /// - `build/` (relative, trailing separator) excludes every directory
    ///   named `build`, wherever it appears.
    /// - `lib/x.so` (relative, inner separator) excludes any path ending in
    ///   `/lib/x.so`.
    /// - anything containing `*` or `?` is a wildcard pattern; relative
    ///   wildcard patterns may match at any depth.
    ///
    /// Rules that fail to compile are logged and skipped.
    pub exclude_paths: Vec<String>,

    /// File extensions to skip, without the dot (`"bat"`, `"iso"`). A
    /// leading dot is tolerated.
    pub exclude_extensions: Vec<String>,

    /// Scan every mounted local hard disc.
    pub hard_drives: bool,

    /// Scan every mounted optical medium.
    pub optical_drives: bool,

    /// Scan every mounted removable device (USB sticks, SD cards, ...).
    pub removable_drives: bool,

    /// Scan every mounted network share.
    pub network_drives: bool,
}

impl Scan {
    /// Whether the policy selects mounts by device kind at all. When it does,
    /// mounts of kinds that were not requested are actively excluded instead
    /// of being silently ignored.
    pub fn requests_device_kinds(&self) -> bool {
        self.hard_drives || self.optical_drives || self.removable_drives || self.network_drives
    }
}
