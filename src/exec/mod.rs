// src/exec/mod.rs

//! Rebuild command execution.

pub mod command;

pub use command::spawn_rebuild_executor;
