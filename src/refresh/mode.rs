// src/refresh/mode.rs

use std::time::Duration;

use crate::errors::{BankwatchError, Result};

/// `cooldown_seconds` value meaning "prompt before every refresh".
pub const PROMPT_COOLDOWN: i64 = -1;

/// `cooldown_seconds` value meaning "manual refresh only".
pub const MANUAL_COOLDOWN: i64 = -2;

/// How automatic rebuilds are gated, decoded from the configured
/// `cooldown_seconds` integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Rebuild automatically once this much time has passed since the last
    /// detected change.
    Cooldown(Duration),
    /// Every detected change asks the user for approval first (`-1`).
    Prompt,
    /// Automatic rebuilds never happen; only explicit user action (`-2`).
    Manual,
}

impl RefreshMode {
    /// Decode the configured integer, rejecting anything below the manual
    /// sentinel.
    pub fn from_cooldown_seconds(secs: i64) -> Result<Self> {
        match secs {
            PROMPT_COOLDOWN => Ok(RefreshMode::Prompt),
            MANUAL_COOLDOWN => Ok(RefreshMode::Manual),
            s if s >= 0 => Ok(RefreshMode::Cooldown(Duration::from_secs(s as u64))),
            s => Err(BankwatchError::InvalidCooldown(s)),
        }
    }

    /// True if a detected change should open the approval prompt.
    ///
    /// Prompt mode always prompts; a plain cooldown prompts only when the
    /// `show_prompt` config flag is set. Manual mode never prompts (there is
    /// nothing to approve).
    pub fn prompts_on_change(&self, show_prompt: bool) -> bool {
        match self {
            RefreshMode::Prompt => true,
            RefreshMode::Cooldown(_) => show_prompt,
            RefreshMode::Manual => false,
        }
    }
}
