#![forbid(unsafe_code)]

use config::Scan;
use scope::audit::{AuditEvent, RecordingAudit};
use scope::mounts::MountRecord;
use scope::planner::InclusionController;
use scope::walk::ScopeWalker;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"x").unwrap();
}

fn plan(scan: &Scan) -> InclusionController {
    let mounts: &[MountRecord] = &[];
    InclusionController::new(scan, mounts, &mut RecordingAudit::default())
}

fn walk(controller: &mut InclusionController) -> Vec<PathBuf> {
    let mut files = Vec::new();
    ScopeWalker::new(controller).walk(|path| files.push(path.to_path_buf()));
    files.sort();
    files
}

fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|path| path.strip_prefix(root).unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn walk_skips_excluded_entries() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for file in [
        "a.txt",
        "skip/b.txt",
        "keep/c.log",
        "keep/d.txt",
        "keep/core",
        "nested/deep/e.txt",
        "nested/deep/f.iso",
        "secret",
    ] {
        touch(root, file);
    }

    let scan = Scan {
        include_paths: vec![root.to_path_buf()],
        exclude_paths: vec![
            format!("{}/skip/", root.display()),
            format!("{}/secret", root.display()),
            "*.log".into(),
            "core".into(),
        ],
        exclude_extensions: vec!["iso".into()],
        ..Scan::default()
    };
    let mut controller = plan(&scan);

    let files = walk(&mut controller);
    assert_eq!(
        relative(root, &files),
        vec!["a.txt", "keep/d.txt", "nested/deep/e.txt"]
    );
}

#[test]
fn directories_named_like_file_rules_are_entered() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for file in [
        "src/core/main.c",
        "src/core/core",
        "project.bat/main.c",
        "project.bat/run.bat",
        "usr/lib/x.so/readme",
        "usr/lib/x.so.1",
    ] {
        touch(root, file);
    }

    let scan = Scan {
        include_paths: vec![root.to_path_buf()],
        exclude_paths: vec!["core".into(), "lib/x.so".into()],
        exclude_extensions: vec!["bat".into()],
        ..Scan::default()
    };
    let mut controller = plan(&scan);

    let files = walk(&mut controller);
    assert_eq!(
        relative(root, &files),
        vec![
            "project.bat/main.c",
            "src/core/main.c",
            "usr/lib/x.so/readme",
            "usr/lib/x.so.1"
        ]
    );
}

#[test]
fn nested_mount_is_scanned_once() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "top.txt");
    touch(root, "usb/photo.jpg");
    touch(root, "usb/album/more.jpg");

    let scan = Scan {
        include_paths: vec![root.to_path_buf()],
        removable_drives: true,
        ..Scan::default()
    };
    let mounts = [MountRecord::removable(root.join("usb"))];
    let mut audit = RecordingAudit::default();
    let mut controller = InclusionController::new(&scan, &mounts, &mut audit);
    assert!(
        audit
            .events()
            .contains(&AuditEvent::MountIncluded(root.join("usb")))
    );

    let mut files = Vec::new();
    let report =
        ScopeWalker::new(&mut controller).walk(|path| files.push(path.to_path_buf()));
    files.sort();

    assert_eq!(report.roots, 2);
    assert_eq!(report.files, 3);
    assert_eq!(
        relative(root, &files),
        vec!["top.txt", "usb/album/more.jpg", "usb/photo.jpg"]
    );
}

#[test]
fn explicit_include_drills_through_broad_exclusion() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "home/alice/notes.txt");
    touch(root, "home/bob/work/report.doc");
    touch(root, "home/bob/work/drafts/old.doc");

    let scan = Scan {
        include_paths: vec![root.join("home/bob/work")],
        exclude_paths: vec![format!("{}/home/", root.display())],
        ..Scan::default()
    };
    let mut controller = plan(&scan);

    let files = walk(&mut controller);
    assert_eq!(
        relative(root, &files),
        vec!["home/bob/work/drafts/old.doc", "home/bob/work/report.doc"]
    );
}

#[test]
fn explicit_file_root_is_reported_and_missing_root_counted() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "single.bin");

    let scan = Scan {
        include_paths: vec![root.join("single.bin"), root.join("missing")],
        ..Scan::default()
    };
    let mut controller = plan(&scan);

    let mut files = Vec::new();
    let report =
        ScopeWalker::new(&mut controller).walk(|path| files.push(path.to_path_buf()));
    assert_eq!(files, vec![root.join("single.bin")]);
    assert_eq!(report.roots, 2);
    assert_eq!(report.errors, 1);
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "outside/target.txt");
    touch(root, "scan/real.txt");
    std::os::unix::fs::symlink(root.join("outside"), root.join("scan/link")).unwrap();

    let scan = Scan {
        include_paths: vec![root.join("scan")],
        ..Scan::default()
    };
    let mut controller = plan(&scan);

    let files = walk(&mut controller);
    assert_eq!(relative(root, &files), vec!["scan/real.txt"]);
}
