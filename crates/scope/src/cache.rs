#![forbid(unsafe_code)]

use crate::clock::{Clock, SystemClock};
use crate::exclusion_set::ExclusionSet;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug)]
struct CacheState {
    exclusions: ExclusionSet,
    decisions: FxHashMap<PathBuf, bool>,
    last_clear: Instant,
}

/// Memoizes exclusion decisions for the on-access path, where the same files
/// are opened over and over.
///
/// Decisions are dropped wholesale when the exclusion list changes and when
/// they are older than the configured lifetime. One lock guards everything;
/// it is never held across I/O.
pub struct ExclusionCache {
    lifetime: Duration,
    clock: Box<dyn Clock>,
    state: Mutex<CacheState>,
}

impl ExclusionCache {
    pub fn new(config: &config::Cache) -> Self {
        Self::with_clock(config.lifetime, Box::new(SystemClock))
    }

    pub fn with_clock(lifetime: Duration, clock: Box<dyn Clock>) -> Self {
        let last_clear = clock.now();
        Self {
            lifetime,
            clock,
            state: Mutex::new(CacheState {
                exclusions: ExclusionSet::default(),
                decisions: FxHashMap::default(),
                last_clear,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the active exclusion list. Returns `true` when it differed
    /// from the previous one, in which case every cached decision is dropped.
    pub fn set_exclusions(&self, exclusions: ExclusionSet) -> bool {
        let mut state = self.lock();
        if state.exclusions == exclusions {
            return false;
        }
        debug!(
            exclusions = %exclusions.combined_pattern(),
            dropped = state.decisions.len(),
            "exclusion list changed"
        );
        state.exclusions = exclusions;
        state.decisions.clear();
        state.last_clear = self.clock.now();
        true
    }

    /// Whether `path`, a concrete file, is excluded from scanning.
    pub fn check_exclusions(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let mut state = self.lock();
        if state.exclusions.is_empty() {
            return false;
        }

        let now = self.clock.now();
        if now.duration_since(state.last_clear) >= self.lifetime {
            trace!(dropped = state.decisions.len(), "exclusion cache expired");
            state.decisions.clear();
            state.last_clear = now;
        }

        if let Some(&excluded) = state.decisions.get(path) {
            return excluded;
        }
        let excluded = state
            .exclusions
            .applies_to_path(&path.to_string_lossy(), false, true);
        state.decisions.insert(path.to_path_buf(), excluded);
        excluded
    }

    /// Number of cached decisions.
    pub fn len(&self) -> usize {
        self.lock().decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ExclusionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ExclusionCache")
            .field("lifetime", &self.lifetime)
            .field("exclusions", &state.exclusions.len())
            .field("cached", &state.decisions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn cache(lifetime: Duration) -> (ExclusionCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ExclusionCache::with_clock(lifetime, Box::new(Arc::clone(&clock)));
        (cache, clock)
    }

    #[test]
    fn empty_list_excludes_nothing_and_caches_nothing() {
        let (cache, _) = cache(Duration::from_secs(60));
        assert!(!cache.check_exclusions("/tmp/file"));
        assert!(cache.is_empty());
    }

    #[test]
    fn setting_the_same_list_twice_keeps_the_cache_warm() {
        let (cache, _) = cache(Duration::from_secs(60));
        assert!(cache.set_exclusions(ExclusionSet::from_patterns(["/tmp/", "*.log"])));
        assert!(cache.check_exclusions("/tmp/file"));
        assert!(!cache.check_exclusions("/etc/passwd"));
        assert_eq!(cache.len(), 2);

        assert!(!cache.set_exclusions(ExclusionSet::from_patterns(["*.log", "/tmp/"])));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn changing_the_list_drops_every_decision() {
        let (cache, _) = cache(Duration::from_secs(60));
        cache.set_exclusions(ExclusionSet::from_patterns(["/tmp/"]));
        assert!(!cache.check_exclusions("/srv/new"));

        assert!(cache.set_exclusions(ExclusionSet::from_patterns(["/srv/"])));
        assert!(cache.is_empty());
        assert!(cache.check_exclusions("/srv/new"));
    }

    #[test]
    fn decisions_expire_after_the_lifetime() {
        let (cache, clock) = cache(Duration::from_secs(10));
        cache.set_exclusions(ExclusionSet::from_patterns(["/tmp/"]));
        cache.check_exclusions("/a");
        cache.check_exclusions("/b");

        clock.advance(Duration::from_secs(9));
        cache.check_exclusions("/a");
        assert_eq!(cache.len(), 2);

        clock.advance(Duration::from_secs(1));
        cache.check_exclusions("/a");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn candidates_are_literal_files() {
        let (cache, _) = cache(Duration::from_secs(60));
        cache.set_exclusions(ExclusionSet::from_patterns(["/tmp/a*b", "/data/"]));
        assert!(cache.check_exclusions("/tmp/accccddddb"));
        assert!(!cache.check_exclusions("/tmp/accccddddb/another_thing"));
        assert!(cache.check_exclusions("/tmp/accccddddb/another_thing_b"));
        assert!(!cache.check_exclusions("/data"));
    }
}
