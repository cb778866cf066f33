// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{error, info, warn};

use crate::watch::flag::SourceChangeFlag;

/// Filesystem watcher over the bank source directory.
///
/// Wraps a `RecommendedWatcher` whose callback sets the shared
/// [`SourceChangeFlag`] for every relevant event. The watcher can be
/// re-pointed at a different directory at runtime via [`set_path`]; an
/// unwatchable path logs a warning and leaves monitoring disabled until the
/// path changes again.
///
/// [`set_path`]: SourceWatcher::set_path
pub struct SourceWatcher {
    inner: RecommendedWatcher,
    watched: Option<PathBuf>,
    active: bool,
}

impl std::fmt::Debug for SourceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceWatcher")
            .field("watched", &self.watched)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl SourceWatcher {
    /// Create a watcher that reports changes through `flag`.
    ///
    /// No directory is watched until [`set_path`] is called.
    ///
    /// [`set_path`]: SourceWatcher::set_path
    pub fn new(flag: Arc<SourceChangeFlag>) -> Result<Self> {
        // Closure called synchronously by notify whenever an event arrives.
        // Event kind and path are irrelevant beyond filtering access noise:
        // everything coalesces into the one dirty flag.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !event.kind.is_access() {
                        flag.mark_changed();
                    }
                }
                Err(err) => {
                    error!(error = %err, "file watch error");
                }
            },
            Config::default(),
        )?;

        Ok(Self {
            inner,
            watched: None,
            active: false,
        })
    }

    /// Point the watcher at a (possibly new) source directory.
    ///
    /// - Re-calling with the path already being watched is a no-op.
    /// - An empty path disables monitoring.
    /// - A path that cannot be watched logs a warning and disables monitoring;
    ///   the next `set_path` with a different path retries.
    pub fn set_path(&mut self, path: &Path) {
        let resolved = resolve(path);

        if self.watched.as_deref() == Some(&resolved) {
            return;
        }

        if self.active {
            if let Some(old) = &self.watched {
                // Best effort; the old directory may already be gone.
                let _ = self.inner.unwatch(old);
            }
        }
        self.active = false;
        self.watched = Some(resolved.clone());

        if path.as_os_str().is_empty() {
            info!("source path empty; change monitoring disabled");
            return;
        }

        match self.inner.watch(&resolved, RecursiveMode::Recursive) {
            Ok(()) => {
                self.active = true;
                info!(path = ?resolved, "watching source directory");
            }
            Err(err) => {
                warn!(
                    path = ?resolved,
                    error = %err,
                    "error watching source directory; monitoring disabled"
                );
            }
        }
    }

    /// True if a directory is currently being monitored.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The directory this watcher is (or last tried to be) pointed at.
    pub fn watched_path(&self) -> Option<&Path> {
        self.watched.as_deref()
    }
}

/// Resolve a configured source path to an absolute one, best-effort.
fn resolve(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::new();
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    absolute.canonicalize().unwrap_or(absolute)
}
