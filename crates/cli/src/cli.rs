use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// scanscope: decide what a malware scan should look at
///
/// scanscope resolves the configured include paths, exclusion patterns and
/// mounted filesystems into the set of files an on-demand scan visits, and
/// answers whether a single file would be skipped on access.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// If not provided, the default locations are checked. They are
    /// `/etc/scanscope/config.toml` and `/etc/scanscope/config.d/*.toml`,
    /// where the latter being a glob pattern. If they don't exist, the default
    /// configuration is used.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the roots an on-demand scan walks, in order.
    Plan {
        /// Also print every inclusion and exclusion decision made while
        /// planning.
        #[arg(short, long)]
        explain: bool,
    },

    /// Walk the planned roots and print every file that would be scanned.
    Walk,

    /// Tell whether each path is excluded from on-access scanning.
    Check {
        #[arg(required = true, value_parser = validate_absolute)]
        paths: Vec<PathBuf>,
    },
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

/// Exclusions are written against absolute paths.
#[inline(always)]
fn validate_absolute(path: &str) -> Result<PathBuf, String> {
    let path = Path::new(path);
    if path.has_root() {
        Ok(path.to_owned())
    } else {
        Err(format!("`{}` is not an absolute path", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["scanscope", "-vv", "plan", "--explain"]).unwrap();
        assert_eq!(cli.command, Command::Plan { explain: true });
        assert!(cli.conffile.is_none());

        let cli = Cli::try_parse_from(["scanscope", "check", "/tmp/a", "/srv/b"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Check {
                paths: vec!["/tmp/a".into(), "/srv/b".into()]
            }
        );
    }

    #[test]
    fn check_needs_a_path() {
        assert!(Cli::try_parse_from(["scanscope", "check"]).is_err());
        assert!(Cli::try_parse_from(["scanscope", "check", "relative"]).is_err());
    }

    #[test]
    fn conffile_must_exist() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["scanscope", "-c", path, "walk"]).unwrap();
        assert_eq!(cli.conffile.as_deref(), Some(file.path()));

        let missing = ["scanscope", "-c", "/nonexistent/scanscope.toml", "walk"];
        assert!(Cli::try_parse_from(missing).is_err());
    }

    fn path_candidates() -> impl Strategy<Value = String> {
        prop_oneof![
            2 => "(/[a-z0-9._-]{1,8}){1,4}",
            1 => "[a-z0-9._-]{1,8}(/[a-z0-9._-]{1,8}){0,3}",
            1 => ".*",
        ]
    }

    proptest! {
        #[test]
        fn test_validate_absolute(path in path_candidates()) {
            match validate_absolute(&path) {
                Ok(parsed) => prop_assert!(path.starts_with('/') && parsed == Path::new(&path)),
                Err(err) => {
                    prop_assert!(!path.starts_with('/'));
                    prop_assert!(err.ends_with("is not an absolute path"));
                }
            }
        }
    }
}
