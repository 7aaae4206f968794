#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use tracing::info;

/// Receives every scope decision the planner makes while it is built, so
/// that a caller can reconstruct why a path was or was not scanned.
pub trait ScanAudit {
    fn directory_included(&mut self, path: &Path);
    fn directory_excluded(&mut self, pattern: &str);
    fn mount_included(&mut self, path: &Path);
    fn mount_excluded(&mut self, path: &Path);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl ScanAudit for TracingAudit {
    fn directory_included(&mut self, path: &Path) {
        info!(event = "directory_included", path = %path.display());
    }

    fn directory_excluded(&mut self, pattern: &str) {
        info!(event = "directory_excluded", pattern);
    }

    fn mount_included(&mut self, path: &Path) {
        info!(event = "mount_included", path = %path.display());
    }

    fn mount_excluded(&mut self, path: &Path) {
        info!(event = "mount_excluded", path = %path.display());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    DirectoryIncluded(PathBuf),
    DirectoryExcluded(String),
    MountIncluded(PathBuf),
    MountExcluded(PathBuf),
}

/// Keeps every event in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingAudit {
    events: Vec<AuditEvent>,
}

impl RecordingAudit {
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<AuditEvent> {
        self.events
    }
}

impl ScanAudit for RecordingAudit {
    fn directory_included(&mut self, path: &Path) {
        self.events
            .push(AuditEvent::DirectoryIncluded(path.to_path_buf()));
    }

    fn directory_excluded(&mut self, pattern: &str) {
        self.events
            .push(AuditEvent::DirectoryExcluded(pattern.to_owned()));
    }

    fn mount_included(&mut self, path: &Path) {
        self.events.push(AuditEvent::MountIncluded(path.to_path_buf()));
    }

    fn mount_excluded(&mut self, path: &Path) {
        self.events.push(AuditEvent::MountExcluded(path.to_path_buf()));
    }
}
