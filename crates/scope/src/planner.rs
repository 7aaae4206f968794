#![forbid(unsafe_code)]

use crate::audit::ScanAudit;
use crate::exclusion::{Exclusion, ExclusionKind, SEPARATOR};
use crate::exclusion_set::ExclusionSet;
use crate::mounts::MountPoint;
use config::Scan;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// A mount point selected because its device kind was requested.
    Mount,
    /// A path the policy asked for directly.
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionRoot {
    pub path: PathBuf,
    pub kind: RootKind,
}

impl InclusionRoot {
    pub fn is_explicit(&self) -> bool {
        self.kind == RootKind::Explicit
    }
}

/// Plans one on-demand scan: which roots to walk, in which order, and which
/// entries below them to skip.
///
/// Mount roots are handed out before explicit roots. While a root is walked,
/// any entry that is itself another root, pending or already walked, is
/// skipped, so a path reachable from two roots is only scanned once.
///
/// Not meant to be shared between threads; one controller per scan.
#[derive(Debug, Default)]
pub struct InclusionController {
    explicit_inclusions: Vec<PathBuf>,
    pending_explicit: VecDeque<PathBuf>,
    pending_mounts: VecDeque<PathBuf>,
    mount_exclusions: Vec<PathBuf>,
    full_path_exclusions: Vec<String>,
    stem_exclusions: Vec<String>,
    explicit_exclusions: ExclusionSet,
    current: Option<InclusionRoot>,
    yielded: FxHashSet<PathBuf>,
}

impl InclusionController {
    pub fn new<M: MountPoint>(scan: &Scan, mounts: &[M], audit: &mut dyn ScanAudit) -> Self {
        let mut controller = Self::default();
        controller.add_explicit_inclusions(&scan.include_paths, audit);
        controller.add_explicit_exclusions(&scan.exclude_paths, &scan.exclude_extensions, audit);
        controller.add_mounts(scan, mounts, audit);

        if controller.pending_explicit.is_empty() && controller.pending_mounts.is_empty() {
            let root = PathBuf::from(SEPARATOR.to_string());
            debug!("nothing selected, scanning from the filesystem root");
            audit.directory_included(&root);
            controller.explicit_inclusions.push(root.clone());
            controller.pending_explicit.push_back(root);
        }
        controller
    }

    fn add_explicit_inclusions(&mut self, paths: &[PathBuf], audit: &mut dyn ScanAudit) {
        for path in paths {
            if !path.has_root() {
                warn!(path = %path.display(), "ignoring relative include path");
                continue;
            }
            let path: PathBuf = path.components().collect();
            audit.directory_included(&path);
            self.explicit_inclusions.push(path.clone());
            self.pending_explicit.push_back(path);
        }
    }

    fn add_explicit_exclusions(
        &mut self,
        patterns: &[String],
        extensions: &[String],
        audit: &mut dyn ScanAudit,
    ) {
        let mut matchers = Vec::new();
        for raw in patterns {
            let exclusion = match Exclusion::parse(raw) {
                Ok(exclusion) => exclusion,
                Err(err) => {
                    warn!(%err, "dropping malformed exclusion");
                    continue;
                }
            };
            match exclusion.kind() {
                ExclusionKind::Invalid => continue,
                ExclusionKind::Stem => {
                    self.stem_exclusions
                        .push(exclusion.normalized_pattern().to_owned());
                }
                ExclusionKind::Fullpath => {
                    self.full_path_exclusions
                        .push(exclusion.normalized_pattern().to_owned());
                    self.stem_exclusions.extend(exclusion.stem_form());
                }
                _ => matchers.push(exclusion),
            }
            audit.directory_excluded(raw);
        }
        for token in extensions {
            let exclusion = Exclusion::extension(token);
            if exclusion.is_valid() {
                audit.directory_excluded(exclusion.normalized_pattern());
                matchers.push(exclusion);
            }
        }
        self.explicit_exclusions = ExclusionSet::new(matchers);
    }

    fn add_mounts<M: MountPoint>(&mut self, scan: &Scan, mounts: &[M], audit: &mut dyn ScanAudit) {
        for mount in mounts {
            let point: PathBuf = mount.mount_point().components().collect();
            let stem = stem_of(&point);

            if mount.is_special() {
                trace!(
                    mount_point = %point.display(),
                    fs_type = mount.filesystem_type(),
                    "special filesystem"
                );
                audit.mount_excluded(&point);
                self.stem_exclusions.push(stem);
                continue;
            }
            if self
                .stem_exclusions
                .iter()
                .any(|excluded| stem.starts_with(excluded.as_str()))
            {
                trace!(mount_point = %point.display(), "mount below an excluded directory");
                continue;
            }

            let requested = (scan.hard_drives && mount.is_hard_disc())
                || (scan.optical_drives && mount.is_optical())
                || (scan.removable_drives && mount.is_removable())
                || (scan.network_drives && mount.is_network());
            if requested {
                audit.mount_included(&point);
                self.pending_mounts.push_back(point);
            } else if scan.requests_device_kinds() {
                audit.mount_excluded(&point);
                self.mount_exclusions.push(point);
            }
        }
    }

    /// Next root to walk, or `None` once every root has been handed out.
    pub fn next_inclusion(&mut self) -> Option<InclusionRoot> {
        while let Some(point) = self.pending_mounts.pop_front() {
            let point_str = point.to_string_lossy();
            if self
                .stem_exclusions
                .iter()
                .any(|stem| stem_covers(stem, &point_str, true))
            {
                debug!(mount_point = %point.display(), "mount root suppressed by exclusion");
                continue;
            }
            if let Some(root) = self.enter(point, RootKind::Mount) {
                return Some(root);
            }
        }
        while let Some(path) = self.pending_explicit.pop_front() {
            if let Some(root) = self.enter(path, RootKind::Explicit) {
                return Some(root);
            }
        }
        self.current = None;
        None
    }

    fn enter(&mut self, path: PathBuf, kind: RootKind) -> Option<InclusionRoot> {
        if !self.yielded.insert(path.clone()) {
            debug!(path = %path.display(), ?kind, "root already scanned");
            return None;
        }
        let root = InclusionRoot { path, kind };
        self.current = Some(root.clone());
        Some(root)
    }

    /// Whether an entry found below the current root should be scanned.
    pub fn include_path(&self, path: impl AsRef<Path>) -> bool {
        self.include_entry(path.as_ref(), false)
    }

    /// Whether the walk should descend into a directory found below the
    /// current root. Stem exclusions also match the directory itself. Pattern
    /// exclusions only prune it when they exclude everything inside: a file
    /// name, relative path or suffix rule that matches the directory's own
    /// name leaves its contents to [`InclusionController::include_path`].
    pub fn include_directory(&self, path: impl AsRef<Path>) -> bool {
        self.include_entry(path.as_ref(), true)
    }

    fn include_entry(&self, path: &Path, is_directory: bool) -> bool {
        let lossy = path.to_string_lossy();
        let path_str = lossy.as_ref();

        let excluded = if is_directory {
            self.explicit_exclusions.covers_directory(path_str)
        } else {
            self.explicit_exclusions.applies_to_path(path_str, false, false)
        };
        if excluded {
            trace!(path = path_str, "matches exclusion pattern");
            return false;
        }
        if self.full_path_exclusions.iter().any(|full| full == path_str) {
            trace!(path = path_str, "matches excluded full path");
            return false;
        }

        let (root_len, root_is_explicit) = match &self.current {
            Some(root) => (root.path.as_os_str().len(), root.is_explicit()),
            None => (0, false),
        };

        // A deeper explicit root drills through a shorter stem exclusion;
        // mount roots never do.
        if self.stem_exclusions.iter().any(|stem| {
            stem_covers(stem, path_str, is_directory)
                && (!root_is_explicit || stem.len() >= root_len)
        }) {
            trace!(path = path_str, "below excluded directory");
            return false;
        }

        if self
            .pending_mounts
            .iter()
            .chain(self.pending_explicit.iter())
            .any(|pending| pending.as_path() == path)
        {
            trace!(path = path_str, "deferred to its own root");
            return false;
        }
        if self.yielded.contains(path)
            && self.current.as_ref().is_some_and(|root| root.path != path)
        {
            trace!(path = path_str, "already walked as its own root");
            return false;
        }

        if root_is_explicit {
            return true;
        }

        !self.mount_exclusions.iter().any(|excluded| {
            path.starts_with(excluded) && excluded.as_os_str().len() > root_len
        })
    }

    pub fn current_inclusion(&self) -> Option<&InclusionRoot> {
        self.current.as_ref()
    }

    /// Every explicit root requested, including the `/` fallback.
    pub fn explicit_inclusions(&self) -> &[PathBuf] {
        &self.explicit_inclusions
    }

    pub fn mount_exclusions(&self) -> &[PathBuf] {
        &self.mount_exclusions
    }

    pub fn full_path_exclusions(&self) -> &[String] {
        &self.full_path_exclusions
    }

    pub fn stem_exclusions(&self) -> &[String] {
        &self.stem_exclusions
    }

    pub fn explicit_exclusions(&self) -> &ExclusionSet {
        &self.explicit_exclusions
    }
}

fn stem_of(path: &Path) -> String {
    let mut stem = path.to_string_lossy().into_owned();
    if !stem.ends_with(SEPARATOR) {
        stem.push(SEPARATOR);
    }
    stem
}

fn stem_covers(stem: &str, path: &str, is_directory: bool) -> bool {
    path.starts_with(stem)
        || (is_directory && stem.strip_suffix(SEPARATOR).is_some_and(|dir| dir == path))
}
