use scope::{AuditEvent, ExclusionCache, InclusionController, RootKind, ScopeWalker, WalkReport};
use std::io::{self, Write};
use std::path::PathBuf;

fn audit_line(event: &AuditEvent) -> String {
    match event {
        AuditEvent::DirectoryIncluded(path) => format!("include        {}", path.display()),
        AuditEvent::DirectoryExcluded(pattern) => format!("exclude        {pattern}"),
        AuditEvent::MountIncluded(path) => format!("include mount  {}", path.display()),
        AuditEvent::MountExcluded(path) => format!("exclude mount  {}", path.display()),
    }
}

/// Drain the controller and print its roots in walk order, optionally
/// preceded by the decisions that produced them.
pub fn write_plan(
    out: &mut impl Write,
    controller: &mut InclusionController,
    explain: Option<&[AuditEvent]>,
) -> io::Result<()> {
    if let Some(events) = explain {
        for event in events {
            writeln!(out, "{}", audit_line(event))?;
        }
        writeln!(out)?;
    }
    while let Some(root) = controller.next_inclusion() {
        let kind = match root.kind {
            RootKind::Mount => "mount",
            RootKind::Explicit => "path",
        };
        writeln!(out, "{kind:<6}{}", root.path.display())?;
    }
    Ok(())
}

/// Print every file the walk visits followed by a one-line summary. The walk
/// stops printing, but not counting, after the first write error.
pub fn write_walk(
    out: &mut impl Write,
    controller: &mut InclusionController,
) -> io::Result<WalkReport> {
    let mut result = Ok(());
    let report = ScopeWalker::new(controller).walk(|path| {
        if result.is_ok() {
            result = writeln!(out, "{}", path.display());
        }
    });
    result?;
    writeln!(
        out,
        "{} roots, {} files, {} excluded, {} errors",
        report.roots, report.files, report.excluded, report.errors
    )?;
    Ok(report)
}

pub fn write_check(
    out: &mut impl Write,
    cache: &ExclusionCache,
    paths: &[PathBuf],
) -> io::Result<()> {
    for path in paths {
        let verdict = if cache.check_exclusions(path) {
            "excluded"
        } else {
            "scan"
        };
        writeln!(out, "{verdict:<9}{}", path.display())?;
    }
    Ok(())
}
