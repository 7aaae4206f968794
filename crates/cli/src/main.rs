#![forbid(unsafe_code)]

mod cli;
mod report;

use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use scope::{
    ExclusionCache, ExclusionSet, InclusionController, ProcfsMounts, RecordingAudit, ScanAudit,
    TracingAudit,
};
use std::io::{self, Write};
use tracing::{debug, trace};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Forwards to the log and keeps a copy for `plan --explain`.
#[derive(Debug, Default)]
struct ExplainAudit {
    log: TracingAudit,
    record: RecordingAudit,
}

impl ScanAudit for ExplainAudit {
    fn directory_included(&mut self, path: &std::path::Path) {
        self.log.directory_included(path);
        self.record.directory_included(path);
    }

    fn directory_excluded(&mut self, pattern: &str) {
        self.log.directory_excluded(pattern);
        self.record.directory_excluded(pattern);
    }

    fn mount_included(&mut self, path: &std::path::Path) {
        self.log.mount_included(path);
        self.record.mount_included(path);
    }

    fn mount_excluded(&mut self, path: &std::path::Path) {
        self.log.mount_excluded(path);
        self.record.mount_excluded(path);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // NOTE: The verbosity flag takes precedence over the environment variable
    // for log control. `SCANSCOPE_LOG` can still set the level per crate, eg.
    // `SCANSCOPE_LOG=scope=trace scanscope walk`.
    let env_filter = EnvFilter::builder()
        .with_env_var("SCANSCOPE_LOG")
        .from_env()?
        .add_directive(cli.verbosity.log_level_filter().as_str().parse()?);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .init();

    // load config
    let config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => {
            let mut candidates = glob::glob("/etc/scanscope/config.d/*.toml")?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            candidates.insert(0, "/etc/scanscope/config.toml".into());
            trace!(?candidates, "config file candidates");
            Config::load_multiple(candidates)?
        }
    };
    debug!(?config, ?cli);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Plan { explain } => {
            let mounts = ProcfsMounts::read()?;
            let mut audit = ExplainAudit::default();
            let mut controller = InclusionController::new(&config.scan, &mounts, &mut audit);
            let events = explain.then(|| audit.record.events());
            report::write_plan(&mut out, &mut controller, events)?;
        }
        Command::Walk => {
            let mounts = ProcfsMounts::read()?;
            let mut controller =
                InclusionController::new(&config.scan, &mounts, &mut TracingAudit);
            let summary = report::write_walk(&mut out, &mut controller)?;
            debug!(?summary, "walk finished");
        }
        Command::Check { paths } => {
            let cache = ExclusionCache::new(&config.cache);
            cache.set_exclusions(ExclusionSet::from_scan(&config.scan));
            report::write_check(&mut out, &cache, paths)?;
        }
    }
    out.flush()?;
    Ok(())
}
