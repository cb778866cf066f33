// src/gate/mod.rs

//! Approval gating for automatic rebuilds.

pub mod prompt;

pub use prompt::PromptGate;

use crate::engine::RebuildOutcome;

/// External approval collaborator consulted before an automatic rebuild.
///
/// The runtime only sees this trait; the console-backed [`PromptGate`] is the
/// production implementation, [`AutoGate`] is used when no confirmation is
/// configured, and tests supply their own.
pub trait ApprovalGate: Send + Sync {
    /// True while an approval prompt is on screen awaiting an answer.
    fn is_visible(&self) -> bool;

    /// True when the gate does not block a rebuild right now (no prompt
    /// pending, or the user already approved).
    fn is_ready(&self) -> bool;

    /// Open the approval prompt. Re-showing while already visible is a no-op.
    fn show(&self);

    /// Notification that a rebuild finished, so the gate can reset itself.
    fn handle_rebuild_result(&self, outcome: &RebuildOutcome);
}

/// Gate used when no approval is required: never visible, always ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoGate;

impl ApprovalGate for AutoGate {
    fn is_visible(&self) -> bool {
        false
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn show(&self) {}

    fn handle_rebuild_result(&self, _outcome: &RebuildOutcome) {}
}
