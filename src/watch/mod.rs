// src/watch/mod.rs

//! Change detection for the bank source directory.
//!
//! The notify callback runs on its own OS thread and only ever touches
//! [`SourceChangeFlag`]; the runtime drains the flag on its tick. Events are
//! coalesced, not queued: any number of changes between two ticks collapses
//! into a single re-arm.

pub mod flag;
pub mod watcher;

pub use flag::SourceChangeFlag;
pub use watcher::SourceWatcher;
