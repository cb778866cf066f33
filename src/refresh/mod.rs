// src/refresh/mod.rs

//! Cooldown scheduling: when is a rebuild allowed to run?

pub mod cooldown;
pub mod mode;
pub mod trigger;

pub use cooldown::CooldownScheduler;
pub use mode::{RefreshMode, MANUAL_COOLDOWN, PROMPT_COOLDOWN};
pub use trigger::{CachePoll, FILE_POLL_PERIOD};
