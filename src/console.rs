// src/console.rs

//! Interactive console commands.
//!
//! This is the CLI stand-in for the original approval window: a background
//! task reads stdin lines and turns them into runtime events. When the prompt
//! gate is active, `y`/`n` answer the pending prompt; otherwise:
//!
//! - `r` / `refresh`      trigger a rebuild now
//! - `watch <path>`       re-point the source watcher (relative paths resolve
//!                        against the config file's directory, like the
//!                        configured source path)
//! - `q` / `quit`         shut down

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::RuntimeEvent;
use crate::gate::PromptGate;

/// Spawn the stdin command loop.
///
/// `prompt` is `Some` when approval prompting is configured; `y`/`n` are
/// ignored otherwise. The loop ends quietly when stdin closes (e.g. running
/// under a supervisor) or the runtime channel is dropped.
pub fn spawn_console(prompt: Option<Arc<PromptGate>>, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        let reader = BufReader::new(tokio::io::stdin());
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let event = match parse_command(line.trim(), prompt.as_deref()) {
                Some(event) => event,
                None => continue,
            };

            if runtime_tx.send(event).await.is_err() {
                // Runtime is gone; nothing left to control.
                return;
            }
        }

        debug!("console loop ended (stdin closed)");
    });
}

/// Interpret one console line. Returns the event to send, if any.
///
/// Prompt answers are applied to the gate here; only the side effects that
/// belong to the runtime (disabling auto-refresh, firing the approved
/// rebuild) travel through the event channel.
pub fn parse_command(line: &str, prompt: Option<&PromptGate>) -> Option<RuntimeEvent> {
    use crate::gate::ApprovalGate;

    if let Some(gate) = prompt {
        if gate.is_visible() {
            match line {
                "y" | "yes" => {
                    gate.approve();
                    return Some(RuntimeEvent::PromptApproved);
                }
                "n" | "no" => {
                    gate.dismiss();
                    return Some(RuntimeEvent::AutoRefreshDisabled);
                }
                _ => {}
            }
        }
    }

    match line {
        "" => None,
        "r" | "refresh" => Some(RuntimeEvent::ManualRefresh),
        "q" | "quit" => Some(RuntimeEvent::ShutdownRequested),
        other => {
            if let Some(path) = other.strip_prefix("watch ") {
                let path = path.trim();
                if path.is_empty() {
                    warn!("usage: watch <path>");
                    None
                } else {
                    Some(RuntimeEvent::SourcePathChanged(PathBuf::from(path)))
                }
            } else {
                warn!(command = %other, "unknown console command");
                None
            }
        }
    }
}
