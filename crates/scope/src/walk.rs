#![forbid(unsafe_code)]

use crate::planner::InclusionController;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkReport {
    pub roots: usize,
    pub files: usize,
    pub excluded: usize,
    pub errors: usize,
}

/// Depth-first walk over every root the controller hands out. Symlinks below
/// a root are never followed.
#[derive(Debug)]
pub struct ScopeWalker<'a> {
    controller: &'a mut InclusionController,
}

impl<'a> ScopeWalker<'a> {
    pub fn new(controller: &'a mut InclusionController) -> Self {
        Self { controller }
    }

    /// Call `visit` for every regular file that should be scanned.
    pub fn walk<F: FnMut(&Path)>(&mut self, mut visit: F) -> WalkReport {
        let mut report = WalkReport::default();
        while let Some(root) = self.controller.next_inclusion() {
            debug!(root = %root.path.display(), kind = ?root.kind, "walking root");
            report.roots += 1;
            self.walk_root(&root.path, &mut visit, &mut report);
        }
        report
    }

    fn walk_root<F: FnMut(&Path)>(&self, root: &Path, visit: &mut F, report: &mut WalkReport) {
        let controller = &*self.controller;
        let mut pruned = 0;
        let entries = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // the root itself was already vetted by the controller
                if entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || controller.include_directory(entry.path())
                {
                    return true;
                }
                pruned += 1;
                false
            });

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(path = ?err.path(), %err, "cannot read entry");
                    report.errors += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.depth() == 0 || controller.include_path(entry.path()) {
                report.files += 1;
                visit(entry.path());
            } else {
                report.excluded += 1;
            }
        }
        report.excluded += pruned;
    }
}
