// src/refresh/trigger.rs

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::fs::FileSystem;

/// How often the cache artifact is checked for existence.
pub const FILE_POLL_PERIOD: Duration = Duration::from_secs(5);

/// Periodic integrity check for the rebuild's cache artifact.
///
/// Every [`FILE_POLL_PERIOD`] the artifact is checked on disk; if it is
/// missing, a rebuild is requested unconditionally. This self-heals against
/// the artifact being deleted by hand. The poll deadline advances whenever the
/// check runs, so a missing artifact requests at most one rebuild per window
/// no matter how often the runtime ticks.
#[derive(Debug)]
pub struct CachePoll {
    cache_path: PathBuf,
    next_poll: Option<Instant>,
}

impl CachePoll {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            // First tick polls immediately.
            next_poll: None,
        }
    }

    pub fn cache_path(&self) -> &std::path::Path {
        &self.cache_path
    }

    /// Run the integrity check if the poll window has elapsed.
    ///
    /// Returns true when the check ran and found the artifact missing.
    pub fn cache_missing(&mut self, now: Instant, fs: &dyn FileSystem) -> bool {
        if let Some(next) = self.next_poll {
            if now < next {
                return false;
            }
        }

        self.next_poll = Some(now + FILE_POLL_PERIOD);

        let missing = !fs.is_file(&self.cache_path);
        if missing {
            debug!(path = ?self.cache_path, "cache artifact missing");
        }
        missing
    }
}
