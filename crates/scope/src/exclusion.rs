#![forbid(unsafe_code)]

//! Classification and matching of a single exclusion rule.
//!
//! An exclusion string is sorted into one of eight shapes the first time it
//! is seen, and the shape alone decides how candidate paths are compared
//! against it:
//!
//! | input          | kind            | matches                                  |
//! |----------------|-----------------|------------------------------------------|
//! | `/var/cache/`  | `Stem`          | everything below `/var/cache/`           |
//! | `/etc/shadow`  | `Fullpath`      | exactly `/etc/shadow`                    |
//! | `build/`       | `RelativeStem`  | anything below a `build` directory       |
//! | `core`         | `Filename`      | any path whose last component is `core`  |
//! | `lib/x.so`     | `RelativePath`  | any path ending in `/lib/x.so`           |
//! | `*.log`        | `Suffix`        | any path ending in `.log`                |
//! | `/tmp/a*b`     | `Glob`          | the anchored wildcard pattern            |
//! | `cache*/x?`    | `RelativeGlob`  | the wildcard pattern at any depth        |
//!
//! `*` matches any run of characters, separators included; `?` matches a
//! single character other than the separator. Every other character is
//! literal. A wildcard pattern ending in the separator covers everything
//! inside the directories it names, like a stem does.
//!
//! File name, relative path, suffix and relative wildcard rules are tail
//! matchers: they compare against the end of the whole candidate, so a
//! directory they match says nothing about the entries inside it.

use crate::error::Error;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

pub(crate) const SEPARATOR: char = '/';
/// Upper bound on the compiled size of one wildcard matcher.
pub(crate) const COMPILED_SIZE_LIMIT: usize = 1 << 20;
const WILDCARDS: &[char] = &['*', '?'];

/// Shape of a parsed exclusion. Declaration order is the sort order: narrow,
/// literal shapes first, wildcard shapes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusionKind {
    Fullpath,
    Stem,
    Filename,
    Suffix,
    RelativePath,
    RelativeStem,
    Glob,
    RelativeGlob,
    Invalid,
}

#[derive(Debug, Clone)]
enum Pattern {
    Fullpath(String),
    Stem(String),
    /// Stored as `/<name>`.
    Filename(String),
    Suffix(String),
    /// Stored as `/<relative path>`.
    RelativePath(String),
    /// Stored as `/<stem>/`.
    RelativeStem(String),
    Glob(GlobPattern),
    RelativeGlob(GlobPattern),
    Invalid,
}

/// A wildcard pattern compiled for two uses: literal files, where the whole
/// path must match, and names met while descending a tree. An anchored
/// pattern also matches below any directory it matches during descent;
/// a relative one stays a tail matcher in both cases.
#[derive(Debug, Clone)]
pub(crate) struct GlobPattern {
    glob: String,
    body: String,
    tree_body: String,
    anchored: bool,
    names_directory: bool,
    exact: Regex,
    tree: Regex,
}

impl GlobPattern {
    fn compile(glob: String) -> Result<Self, regex::Error> {
        let anchored = glob.starts_with(SEPARATOR);
        let names_directory = glob.ends_with(SEPARATOR);
        let mut body = glob_to_regex(&glob);
        if names_directory {
            body.push_str(".*");
        }
        let tree_body = if anchored {
            format!("(?:{body})(?:/.*)?")
        } else {
            body.clone()
        };
        let exact = compile_regex(&exact_regex(&body))?;
        let tree = if anchored {
            compile_regex(&exact_regex(&tree_body))?
        } else {
            exact.clone()
        };
        Ok(Self {
            glob,
            body,
            tree_body,
            anchored,
            names_directory,
            exact,
            tree,
        })
    }

    pub(crate) fn body(&self) -> &str {
        &self.body
    }

    pub(crate) fn tree_body(&self) -> &str {
        &self.tree_body
    }

    fn is_match(&self, path: &str, path_is_literal_file: bool) -> bool {
        if path_is_literal_file {
            self.exact.is_match(path)
        } else {
            self.tree.is_match(path)
        }
    }

    /// Whether `dir` matches in a way that every entry below it matches too.
    fn covers_directory(&self, dir: &str) -> bool {
        (self.anchored && self.tree.is_match(dir))
            || (self.names_directory && self.exact.is_match(&format!("{dir}{SEPARATOR}")))
    }
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
}

pub(crate) fn exact_regex(body: &str) -> String {
    format!("(?s)^(?:{body})$")
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut buf = [0u8; 4];
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push_str("[^/]"),
            _ => out.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }
    out
}

/// One parsed exclusion rule. Immutable once built.
#[derive(Debug, Clone)]
pub struct Exclusion {
    display_path: String,
    pattern: Pattern,
}

impl Exclusion {
    /// Classify `raw` and build its matcher. An empty string yields an
    /// [`ExclusionKind::Invalid`] exclusion that never matches.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let pattern = classify(raw).map_err(|source| Error::Pattern {
            pattern: raw.to_owned(),
            source,
        })?;
        Ok(Self {
            display_path: raw.to_owned(),
            pattern,
        })
    }

    /// Build a "ends with `.<token>`" exclusion from a bare extension.
    pub fn extension(token: &str) -> Self {
        let bare = token.strip_prefix('.').unwrap_or(token);
        let pattern = if bare.is_empty() {
            Pattern::Invalid
        } else {
            Pattern::Suffix(format!(".{bare}"))
        };
        Self {
            display_path: token.to_owned(),
            pattern,
        }
    }

    pub fn kind(&self) -> ExclusionKind {
        match self.pattern {
            Pattern::Fullpath(_) => ExclusionKind::Fullpath,
            Pattern::Stem(_) => ExclusionKind::Stem,
            Pattern::Filename(_) => ExclusionKind::Filename,
            Pattern::Suffix(_) => ExclusionKind::Suffix,
            Pattern::RelativePath(_) => ExclusionKind::RelativePath,
            Pattern::RelativeStem(_) => ExclusionKind::RelativeStem,
            Pattern::Glob(_) => ExclusionKind::Glob,
            Pattern::RelativeGlob(_) => ExclusionKind::RelativeGlob,
            Pattern::Invalid => ExclusionKind::Invalid,
        }
    }

    /// Canonical form used for equality, ordering and audit output.
    pub fn normalized_pattern(&self) -> &str {
        match &self.pattern {
            Pattern::Fullpath(s)
            | Pattern::Stem(s)
            | Pattern::Filename(s)
            | Pattern::Suffix(s)
            | Pattern::RelativePath(s)
            | Pattern::RelativeStem(s) => s,
            Pattern::Glob(glob) | Pattern::RelativeGlob(glob) => &glob.glob,
            Pattern::Invalid => "",
        }
    }

    /// The string as the user wrote it. Never used for matching.
    pub fn display_path(&self) -> &str {
        &self.display_path
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.pattern, Pattern::Invalid)
    }

    /// Directory-prefix form of an absolute exclusion. A full path `/a/b`
    /// yields `/a/b/` so that its subtree is excluded too.
    pub fn stem_form(&self) -> Option<String> {
        match &self.pattern {
            Pattern::Stem(stem) => Some(stem.clone()),
            Pattern::Fullpath(full) => Some(format!("{full}{SEPARATOR}")),
            _ => None,
        }
    }

    pub(crate) fn glob(&self) -> Option<&GlobPattern> {
        match &self.pattern {
            Pattern::Glob(glob) | Pattern::RelativeGlob(glob) => Some(glob),
            _ => None,
        }
    }

    /// Shorthand for [`Exclusion::applies_to_path`] with both flags off.
    pub fn applies_to(&self, path: &str) -> bool {
        self.applies_to_path(path, false, false)
    }

    /// Whether this exclusion covers `path`.
    ///
    /// `is_known_directory` lets stem rules match the directory they name,
    /// not only its contents. Full path and wildcard rules ignore it.
    ///
    /// `path_is_literal_file` requires wildcard rules to match the whole
    /// path. Without it an anchored wildcard rule also matches everything
    /// below a directory it matches.
    pub fn applies_to_path(
        &self,
        path: &str,
        is_known_directory: bool,
        path_is_literal_file: bool,
    ) -> bool {
        match &self.pattern {
            Pattern::Fullpath(full) => path == full,
            Pattern::Stem(stem) => {
                path.starts_with(stem.as_str())
                    || (is_known_directory && path == trim_separator(stem))
            }
            Pattern::RelativeStem(stem) => {
                path.contains(stem.as_str())
                    || (is_known_directory && path.ends_with(trim_separator(stem)))
            }
            Pattern::Filename(tail) | Pattern::RelativePath(tail) => path.ends_with(tail.as_str()),
            Pattern::Suffix(suffix) => suffix_matches(path, suffix),
            Pattern::Glob(glob) | Pattern::RelativeGlob(glob) => {
                glob.is_match(path, path_is_literal_file)
            }
            Pattern::Invalid => false,
        }
    }

    /// Whether `dir` and everything below it are excluded, so a walk can skip
    /// the directory without reading it. Only stem and wildcard rules ever
    /// say so. A full path rule covers its subtree through [`Exclusion::stem_form`].
    pub fn covers_directory(&self, dir: &str) -> bool {
        match &self.pattern {
            Pattern::Stem(_) | Pattern::RelativeStem(_) => self.applies_to_path(dir, true, false),
            Pattern::Glob(glob) | Pattern::RelativeGlob(glob) => glob.covers_directory(dir),
            Pattern::Fullpath(_)
            | Pattern::Filename(_)
            | Pattern::Suffix(_)
            | Pattern::RelativePath(_)
            | Pattern::Invalid => false,
        }
    }
}

fn classify(raw: &str) -> Result<Pattern, regex::Error> {
    if raw.is_empty() {
        return Ok(Pattern::Invalid);
    }
    let absolute = raw.starts_with(SEPARATOR);

    if raw.contains(WILDCARDS) {
        if absolute {
            return Ok(Pattern::Glob(GlobPattern::compile(raw.to_owned())?));
        }
        // `*<literal>` behaves exactly like `*/*<literal>` against absolute
        // paths, so skip the regex.
        if let Some(tail) = raw.strip_prefix('*')
            && !tail.is_empty()
            && !tail.contains(WILDCARDS)
            && !tail.ends_with(SEPARATOR)
        {
            return Ok(Pattern::Suffix(tail.to_owned()));
        }
        let fragment = format!("*{SEPARATOR}{raw}");
        return Ok(Pattern::RelativeGlob(GlobPattern::compile(fragment)?));
    }

    let pattern = if absolute {
        if raw.ends_with(SEPARATOR) {
            Pattern::Stem(raw.to_owned())
        } else {
            Pattern::Fullpath(raw.to_owned())
        }
    } else if raw.ends_with(SEPARATOR) {
        Pattern::RelativeStem(format!("{SEPARATOR}{raw}"))
    } else if !raw.contains(SEPARATOR) {
        Pattern::Filename(format!("{SEPARATOR}{raw}"))
    } else {
        Pattern::RelativePath(format!("{SEPARATOR}{raw}"))
    };
    Ok(pattern)
}

fn trim_separator(stem: &str) -> &str {
    stem.strip_suffix(SEPARATOR).unwrap_or(stem)
}

/// Literal equivalent of the glob `*/*<suffix>`: the suffix ends the whole
/// path and starts after its first separator.
fn suffix_matches(path: &str, suffix: &str) -> bool {
    path.find(SEPARATOR)
        .is_some_and(|first| path.len() - first > suffix.len() && path.ends_with(suffix))
}

impl PartialEq for Exclusion {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.normalized_pattern() == other.normalized_pattern()
    }
}

impl Eq for Exclusion {}

impl PartialOrd for Exclusion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Exclusion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind()
            .cmp(&other.kind())
            .then_with(|| self.normalized_pattern().cmp(other.normalized_pattern()))
    }
}

impl Hash for Exclusion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.normalized_pattern().hash(state);
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_path)
    }
}
