#![forbid(unsafe_code)]

use crate::exclusion::{Exclusion, GlobPattern, compile_regex, exact_regex};
use config::Scan;
use regex::Regex;
use std::slice;
use tracing::{debug, warn};

const ALTERNATION: &str = "|";

#[derive(Debug, Clone)]
struct CombinedGlobs {
    exact: Regex,
    tree: Regex,
}

/// Sorted, de-duplicated collection of exclusions that matches a path when
/// any member does. Wildcard members are folded into a single regex.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    members: Vec<Exclusion>,
    globs: Option<CombinedGlobs>,
}

impl ExclusionSet {
    pub fn new(exclusions: impl IntoIterator<Item = Exclusion>) -> Self {
        let mut members: Vec<Exclusion> = exclusions
            .into_iter()
            .filter(Exclusion::is_valid)
            .collect();
        members.sort();
        members.dedup();
        let globs = Self::combine_globs(&members);
        Self { members, globs }
    }

    /// Parse every pattern, dropping (and logging) the ones that fail to
    /// compile.
    pub fn from_patterns<T: AsRef<str>>(patterns: impl IntoIterator<Item = T>) -> Self {
        let exclusions = patterns
            .into_iter()
            .filter_map(|raw| match Exclusion::parse(raw.as_ref()) {
                Ok(exclusion) => Some(exclusion),
                Err(err) => {
                    warn!(%err, "dropping malformed exclusion");
                    None
                }
            });
        Self::new(exclusions)
    }

    /// Every path pattern and extension token a scan configuration lists.
    pub fn from_scan(scan: &Scan) -> Self {
        let extensions = scan
            .exclude_extensions
            .iter()
            .map(String::as_str)
            .map(Exclusion::extension);
        Self::from_patterns(&scan.exclude_paths)
            .members
            .into_iter()
            .chain(extensions)
            .collect()
    }

    fn combine_globs(members: &[Exclusion]) -> Option<CombinedGlobs> {
        let globs: Vec<&GlobPattern> = members.iter().filter_map(Exclusion::glob).collect();
        if globs.len() < 2 {
            return None;
        }
        let alternation = |body: fn(&GlobPattern) -> &str| {
            globs
                .iter()
                .map(|glob| format!("(?:{})", body(glob)))
                .collect::<Vec<_>>()
                .join(ALTERNATION)
        };
        match (
            compile_regex(&exact_regex(&alternation(GlobPattern::body))),
            compile_regex(&exact_regex(&alternation(GlobPattern::tree_body))),
        ) {
            (Ok(exact), Ok(tree)) => {
                debug!(globs = globs.len(), "combined wildcard exclusions");
                Some(CombinedGlobs { exact, tree })
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(%err, "wildcard exclusions too large to combine, matching one by one");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Exclusion> {
        self.members.iter()
    }

    /// Member patterns joined with `|`, for audit logs.
    pub fn combined_pattern(&self) -> String {
        self.members
            .iter()
            .map(Exclusion::normalized_pattern)
            .collect::<Vec<_>>()
            .join(ALTERNATION)
    }

    pub fn applies_to(&self, path: &str) -> bool {
        self.applies_to_path(path, false, false)
    }

    /// Whether any member covers `path`. See [`Exclusion::applies_to_path`].
    pub fn applies_to_path(
        &self,
        path: &str,
        is_known_directory: bool,
        path_is_literal_file: bool,
    ) -> bool {
        if let Some(globs) = &self.globs {
            let regex = if path_is_literal_file {
                &globs.exact
            } else {
                &globs.tree
            };
            if regex.is_match(path) {
                return true;
            }
        }
        let combined = self.globs.is_some();
        self.members
            .iter()
            .filter(|member| !(combined && member.glob().is_some()))
            .any(|member| member.applies_to_path(path, is_known_directory, path_is_literal_file))
    }

    /// Whether some member excludes `dir` together with everything below it.
    /// See [`Exclusion::covers_directory`].
    pub fn covers_directory(&self, dir: &str) -> bool {
        self.members.iter().any(|member| member.covers_directory(dir))
    }
}

impl PartialEq for ExclusionSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for ExclusionSet {}

impl FromIterator<Exclusion> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = Exclusion>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a ExclusionSet {
    type Item = &'a Exclusion;
    type IntoIter = slice::Iter<'a, Exclusion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
