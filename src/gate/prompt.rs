// src/gate/prompt.rs

use std::sync::Mutex;

use tracing::info;

use crate::engine::RebuildOutcome;
use crate::gate::ApprovalGate;

#[derive(Debug, Default)]
struct PromptState {
    visible: bool,
    approved: bool,
}

/// Console-backed approval gate.
///
/// `show()` prints the prompt once and marks it visible; the console loop
/// routes `y`/`n` answers to [`approve`]/[`dismiss`]. An approval keeps the
/// prompt "visible" (so further changes don't re-open it) until the rebuild it
/// unlocked completes, at which point the gate resets.
///
/// [`approve`]: PromptGate::approve
/// [`dismiss`]: PromptGate::dismiss
#[derive(Debug, Default)]
pub struct PromptGate {
    state: Mutex<PromptState>,
}

impl PromptGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// User answered `y`: the pending rebuild may proceed.
    pub fn approve(&self) {
        let mut state = self.state.lock().unwrap();
        if state.visible {
            state.approved = true;
            info!("bank refresh approved");
        }
    }

    /// User answered `n`: close the prompt without approving. The caller is
    /// responsible for disabling auto-refresh alongside this.
    pub fn dismiss(&self) {
        let mut state = self.state.lock().unwrap();
        if state.visible {
            state.visible = false;
            state.approved = false;
            info!("bank refresh dismissed");
        }
    }
}

impl ApprovalGate for PromptGate {
    fn is_visible(&self) -> bool {
        self.state.lock().unwrap().visible
    }

    fn is_ready(&self) -> bool {
        let state = self.state.lock().unwrap();
        !state.visible || state.approved
    }

    fn show(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.visible {
            state.visible = true;
            state.approved = false;
            println!("bankwatch: source files changed; refresh banks? [y/n]");
        }
    }

    fn handle_rebuild_result(&self, outcome: &RebuildOutcome) {
        let mut state = self.state.lock().unwrap();
        state.visible = false;
        state.approved = false;

        match outcome {
            RebuildOutcome::Success => println!("bankwatch: bank refresh complete"),
            RebuildOutcome::Failed(code) => {
                println!("bankwatch: bank refresh failed (exit code {code})")
            }
        }
    }
}
