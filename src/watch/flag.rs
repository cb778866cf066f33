// src/watch/flag.rs

use std::sync::atomic::{AtomicBool, Ordering};

/// Coalescing dirty flag shared between the notify callback thread and the
/// runtime tick.
///
/// The callback only ever sets the flag; the tick drains it with [`take`],
/// so a burst of filesystem events within one tick period registers as a
/// single change.
///
/// [`take`]: SourceChangeFlag::take
#[derive(Debug, Default)]
pub struct SourceChangeFlag {
    dirty: AtomicBool,
}

impl SourceChangeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the watched directory as changed. Called from the notify callback
    /// for every create/modify/delete event, regardless of which file changed.
    pub fn mark_changed(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Drain the flag: returns true if at least one change arrived since the
    /// last call, and resets it to clean.
    pub fn take(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    /// Discard any pending change without reporting it. Used when the watch
    /// path changes, so stale events from the old directory don't re-arm the
    /// cooldown.
    pub fn clear(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    /// Non-draining peek, for logging and tests.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}
