// src/exec/command.rs

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::{RebuildOutcome, RebuildReason, RuntimeEvent};

/// Spawn the background rebuild executor.
///
/// The returned `mpsc::Sender<RebuildReason>` is what the runtime uses as
/// `exec_tx`. Requests are processed one at a time, in order: the rebuild is
/// fire-and-forget from the runtime's perspective, but back-to-back requests
/// never run the command concurrently.
pub fn spawn_rebuild_executor(
    cmd: String,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<RebuildReason> {
    let (tx, mut rx) = mpsc::channel::<RebuildReason>(32);

    tokio::spawn(async move {
        info!("rebuild executor started");
        while let Some(reason) = rx.recv().await {
            run_rebuild(&cmd, reason, &runtime_tx).await;
        }
        info!("rebuild executor finished (channel closed)");
    });

    tx
}

/// Run one rebuild, handling stdout/stderr and emitting a `RebuildCompleted`
/// event on success/failure.
///
/// All errors are converted into a failed completion event with exit code -1;
/// they are also logged via `tracing::error!`.
async fn run_rebuild(cmd: &str, reason: RebuildReason, runtime_tx: &mpsc::Sender<RuntimeEvent>) {
    if let Err(err) = run_rebuild_inner(cmd, reason, runtime_tx).await {
        error!(error = %err, "rebuild execution error");
        let _ = runtime_tx
            .send(RuntimeEvent::RebuildCompleted {
                reason,
                outcome: RebuildOutcome::Failed(-1),
            })
            .await;
    }
}

async fn run_rebuild_inner(
    cmd: &str,
    reason: RebuildReason,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> Result<()> {
    info!(?reason, cmd = %cmd, "starting rebuild process");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().context("spawning rebuild process")?;

    // Stream both pipes to the log so buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                debug!("rebuild stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                debug!("rebuild stderr: {}", line);
            }
        });
    }

    let status = child.wait().await.context("waiting for rebuild process")?;

    let code = status.code().unwrap_or(-1);
    let outcome = if status.success() {
        RebuildOutcome::Success
    } else {
        RebuildOutcome::Failed(code)
    };

    info!(
        exit_code = code,
        success = status.success(),
        "rebuild process exited"
    );

    runtime_tx
        .send(RuntimeEvent::RebuildCompleted { reason, outcome })
        .await
        .context("sending RebuildCompleted event to runtime")?;

    Ok(())
}
