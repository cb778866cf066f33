// src/engine/mod.rs

//! The runtime event loop driving change detection, cooldown scheduling and
//! rebuild triggering.

pub mod runtime;

pub use runtime::{
    RebuildOutcome, RebuildReason, Runtime, RuntimeEvent, RuntimeOptions, TICK_PERIOD,
};
