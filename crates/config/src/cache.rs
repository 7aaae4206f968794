#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Cache {
    /// How long exclusion decisions made on the on-access path are
    /// remembered before the whole cache is dropped and rebuilt. **Measured
    /// in seconds**.
    ///
    /// ## Note
    ///
    /// The cache is also dropped whenever the exclusion list changes, so this
    /// only bounds how stale an answer can get for paths whose state changes
    /// underneath an unchanged policy.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub lifetime: Duration,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(60),
        }
    }
}
