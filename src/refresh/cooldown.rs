// src/refresh/cooldown.rs

use std::time::{Duration, Instant};

use tracing::debug;

use crate::refresh::mode::RefreshMode;

/// Cooldown state machine deciding when an automatic rebuild is due.
///
/// Holds the timestamp of the last coalesced source change plus the
/// auto-refresh arm/disarm bit. All queries take an explicit `now` so the
/// runtime (and tests) control the clock.
///
/// "Infinite" — no automatic rebuild pending — is represented as `None`
/// throughout, both for `last_change` and for [`time_until_refresh`].
///
/// [`time_until_refresh`]: CooldownScheduler::time_until_refresh
#[derive(Debug)]
pub struct CooldownScheduler {
    mode: RefreshMode,
    auto_refresh: bool,
    last_change: Option<Instant>,
}

impl CooldownScheduler {
    pub fn new(mode: RefreshMode) -> Self {
        Self {
            mode,
            auto_refresh: true,
            last_change: None,
        }
    }

    pub fn mode(&self) -> RefreshMode {
        self.mode
    }

    /// Record a coalesced source change at `now`.
    ///
    /// Auto-refresh is re-armed by a fresh change, but only while the approval
    /// prompt is not on screen: a user who cancelled the prompt should not
    /// have their decision overridden by events arriving while it is still
    /// visible.
    pub fn record_change(&mut self, now: Instant, gate_visible: bool) {
        self.last_change = Some(now);

        if !gate_visible {
            self.auto_refresh = true;
        }

        debug!(gate_visible, "source change recorded; cooldown armed");
    }

    /// Disable automatic rebuilds (e.g. the user cancelled the prompt).
    /// Re-armed by the next change while the prompt is hidden.
    pub fn disable_auto_refresh(&mut self) {
        self.auto_refresh = false;
        debug!("auto-refresh disabled");
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.auto_refresh
    }

    /// Reset the pending change to the infinite sentinel, so the cooldown
    /// condition does not re-fire until another change arrives.
    pub fn clear_pending(&mut self) {
        self.last_change = None;
    }

    pub fn has_pending_change(&self) -> bool {
        self.last_change.is_some()
    }

    /// Time since the last recorded change, or `None` if no change is pending.
    pub fn time_since_change(&self, now: Instant) -> Option<Duration> {
        self.last_change
            .map(|last| now.saturating_duration_since(last))
    }

    /// Remaining time until an automatic rebuild is due.
    ///
    /// Returns `None` ("never") when:
    /// - auto-refresh is disabled,
    /// - no change is pending,
    /// - the mode is `Prompt` or `Manual` (no automatic cooldown),
    /// - the cooldown is too large to represent on the monotonic clock.
    ///
    /// Otherwise `max(0, last_change + cooldown - now)`; the result is
    /// clamped, never negative.
    pub fn time_until_refresh(&self, now: Instant) -> Option<Duration> {
        if !self.auto_refresh {
            return None;
        }

        let last = self.last_change?;

        let RefreshMode::Cooldown(cooldown) = self.mode else {
            return None;
        };

        let due = last.checked_add(cooldown)?;
        Some(due.saturating_duration_since(now))
    }

    /// True when the cooldown has fully elapsed and a rebuild may fire now.
    pub fn refresh_due(&self, now: Instant) -> bool {
        self.time_until_refresh(now) == Some(Duration::ZERO)
    }
}
