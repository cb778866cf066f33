// src/engine/runtime.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::fs::FileSystem;
use crate::gate::ApprovalGate;
use crate::refresh::{CachePoll, CooldownScheduler, RefreshMode};
use crate::watch::{SourceChangeFlag, SourceWatcher};

/// How often the runtime evaluates its triggers. This replaces the original
/// host's per-frame callback with an explicit timer.
pub const TICK_PERIOD: Duration = Duration::from_millis(250);

/// Why a rebuild was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    /// The cache artifact was missing at an integrity poll.
    CacheMissing,
    /// The cooldown after the last source change elapsed.
    CooldownElapsed,
    /// The user approved a pending prompt in prompt mode.
    Approved,
    /// Explicit user action.
    Manual,
}

/// Result of a rebuild process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    Success,
    Failed(i32), // exit code
}

/// Events sent into the runtime from the console, executor, or external
/// signals.
///
/// The idea is that:
/// - the console sends `ManualRefresh`, `AutoRefreshDisabled` and
///   `SourcePathChanged`
/// - the executor sends `RebuildCompleted`
/// - Ctrl-C handling sends `ShutdownRequested`
///
/// Filesystem changes do **not** arrive here: the watcher coalesces them into
/// the shared [`SourceChangeFlag`], which the tick drains.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    ManualRefresh,
    /// The user approved the pending prompt. In prompt mode this is what
    /// actually fires the rebuild; with a plain cooldown it merely unblocks
    /// the gate and the cooldown-elapsed check fires on the next tick.
    PromptApproved,
    AutoRefreshDisabled,
    SourcePathChanged(PathBuf),
    RebuildCompleted {
        reason: RebuildReason,
        outcome: RebuildOutcome,
    },
    ShutdownRequested,
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// If true, exit after the first rebuild completes. Used by `--once`.
    pub exit_after_rebuild: bool,

    /// If true, a detected change opens the approval prompt even when a plain
    /// cooldown is configured. Derived from `RefreshMode::prompts_on_change`.
    pub prompt_on_change: bool,

    /// Directory that relative source paths resolve against: the config
    /// file's directory, the same rule the configured `source.path` uses.
    pub source_root: PathBuf,
}

/// The main orchestration runtime.
///
/// Responsibilities, evaluated once per tick:
/// - Drain the coalesced change flag and arm the cooldown.
/// - Run the cache integrity poll and request a rebuild if the artifact is
///   missing.
/// - Request a rebuild when the cooldown has elapsed and the approval gate
///   reports ready, then reset the pending change so one burst fires once.
///
/// Between ticks it consumes [`RuntimeEvent`]s from the console, executor and
/// signal handler.
pub struct Runtime {
    scheduler: CooldownScheduler,
    poll: CachePoll,
    flag: Arc<SourceChangeFlag>,
    gate: Arc<dyn ApprovalGate>,
    fs: Arc<dyn FileSystem>,
    options: RuntimeOptions,

    /// Kept here so re-pointing on `SourcePathChanged` works; `None` in
    /// one-shot mode where nothing is watched.
    watcher: Option<SourceWatcher>,

    /// Unified event stream from all producers (console, executor, signal
    /// handler).
    events_rx: mpsc::Receiver<RuntimeEvent>,

    /// Channel to the executor: each message requests one rebuild.
    exec_tx: mpsc::Sender<RebuildReason>,
}

impl Runtime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scheduler: CooldownScheduler,
        poll: CachePoll,
        flag: Arc<SourceChangeFlag>,
        gate: Arc<dyn ApprovalGate>,
        fs: Arc<dyn FileSystem>,
        options: RuntimeOptions,
        watcher: Option<SourceWatcher>,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        exec_tx: mpsc::Sender<RebuildReason>,
    ) -> Self {
        Self {
            scheduler,
            poll,
            flag,
            gate,
            fs,
            options,
            watcher,
            events_rx,
            exec_tx,
        }
    }

    /// Main event loop: a fixed-period tick interleaved with runtime events.
    pub async fn run(mut self) -> Result<()> {
        info!("bankwatch runtime started");

        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(Instant::now()).await?;
                }
                event = self.events_rx.recv() => {
                    let Some(event) = event else {
                        debug!("all event senders dropped; stopping runtime");
                        break;
                    };

                    debug!(?event, "runtime received event");
                    if !self.handle_event(event).await? {
                        break;
                    }
                }
            }
        }

        info!("bankwatch runtime exiting");
        Ok(())
    }

    /// One scheduler tick at time `now`.
    ///
    /// Public so tests can drive the runtime with a synthetic clock instead of
    /// the interval in [`run`].
    ///
    /// [`run`]: Runtime::run
    pub async fn tick(&mut self, now: Instant) -> Result<()> {
        self.check_source_files_changed(now);
        self.check_cache_file_exists(now).await?;
        self.refresh_banks_if_ready(now).await?;
        Ok(())
    }

    /// Drain the coalesced dirty flag; arm the cooldown and open the prompt if
    /// configured.
    fn check_source_files_changed(&mut self, now: Instant) {
        if !self.flag.take() {
            return;
        }

        self.scheduler.record_change(now, self.gate.is_visible());

        if self.options.prompt_on_change {
            self.gate.show();
        }
    }

    /// Integrity check: a missing cache artifact requests a rebuild
    /// unconditionally, at most once per poll window.
    async fn check_cache_file_exists(&mut self, now: Instant) -> Result<()> {
        if self.poll.cache_missing(now, self.fs.as_ref()) {
            info!(path = ?self.poll.cache_path(), "cache artifact missing; requesting rebuild");
            self.request_rebuild(RebuildReason::CacheMissing).await?;
        }
        Ok(())
    }

    /// Cooldown check: fire once per dirty period when the cooldown elapsed
    /// and the gate does not block.
    async fn refresh_banks_if_ready(&mut self, now: Instant) -> Result<()> {
        if self.scheduler.refresh_due(now) && self.gate.is_ready() {
            info!("cooldown elapsed; requesting rebuild");
            self.request_rebuild(RebuildReason::CooldownElapsed).await?;
            // Reset to the infinite sentinel so this does not re-fire until
            // another change arrives.
            self.scheduler.clear_pending();
        }
        Ok(())
    }

    /// Handle a runtime event. Returns false when the loop should stop.
    ///
    /// Public for the same reason as [`tick`]: tests inject events directly
    /// instead of going through the channel in [`run`].
    ///
    /// [`tick`]: Runtime::tick
    /// [`run`]: Runtime::run
    pub async fn handle_event(&mut self, event: RuntimeEvent) -> Result<bool> {
        match event {
            RuntimeEvent::ManualRefresh => {
                info!("manual refresh requested");
                self.request_rebuild(RebuildReason::Manual).await?;
                self.scheduler.clear_pending();
                Ok(true)
            }
            RuntimeEvent::PromptApproved => {
                if matches!(self.scheduler.mode(), RefreshMode::Prompt)
                    && self.scheduler.has_pending_change()
                {
                    info!("prompt approved; requesting rebuild");
                    self.request_rebuild(RebuildReason::Approved).await?;
                    self.scheduler.clear_pending();
                }
                Ok(true)
            }
            RuntimeEvent::AutoRefreshDisabled => {
                self.scheduler.disable_auto_refresh();
                Ok(true)
            }
            RuntimeEvent::SourcePathChanged(path) => {
                self.set_source_path(&path);
                Ok(true)
            }
            RuntimeEvent::RebuildCompleted { reason, outcome } => {
                self.handle_rebuild_completed(reason, outcome);
                if self.options.exit_after_rebuild {
                    info!("rebuild finished and exit_after_rebuild=true, stopping");
                    return Ok(false);
                }
                Ok(true)
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested, stopping runtime");
                Ok(false)
            }
        }
    }

    /// Re-point the watcher at a new source directory.
    ///
    /// Relative paths resolve against [`RuntimeOptions::source_root`], the
    /// same rule the configured source path uses. The dirty flag is cleared
    /// so stale events from the old directory don't re-arm the cooldown. A
    /// path that cannot be watched is logged inside `set_path` and monitoring
    /// stays disabled until the next path change.
    pub fn set_source_path(&mut self, path: &Path) {
        let resolved = if path.as_os_str().is_empty() || path.is_absolute() {
            path.to_path_buf()
        } else {
            self.options.source_root.join(path)
        };

        match &mut self.watcher {
            Some(watcher) => {
                self.flag.clear();
                watcher.set_path(&resolved);
            }
            None => {
                warn!("no watcher in this mode; ignoring source path change");
            }
        }
    }

    /// The directory currently monitored for source changes, if any.
    pub fn watched_source_path(&self) -> Option<&Path> {
        self.watcher.as_ref().and_then(SourceWatcher::watched_path)
    }

    /// Completion callback from the executor.
    ///
    /// The pending change is reset regardless of outcome, so a failed rebuild
    /// is not retried until a new change arrives.
    fn handle_rebuild_completed(&mut self, reason: RebuildReason, outcome: RebuildOutcome) {
        match outcome {
            RebuildOutcome::Success => {
                info!(?reason, "rebuild completed successfully");
            }
            RebuildOutcome::Failed(code) => {
                warn!(
                    ?reason,
                    exit_code = code,
                    "rebuild failed; waiting for a new source change before retrying"
                );
            }
        }

        self.scheduler.clear_pending();
        self.gate.handle_rebuild_result(&outcome);
    }

    /// Fire-and-forget rebuild request to the executor.
    async fn request_rebuild(&mut self, reason: RebuildReason) -> Result<()> {
        if let Err(err) = self.exec_tx.send(reason).await {
            error!(error = %err, "failed to send rebuild request to executor");
            // If the executor channel is closed, there's not much we can do.
            // Bubble up the error so higher layers can decide what to do.
            return Err(err.into());
        }
        Ok(())
    }

    /// Remaining time until an automatic rebuild, exposed for status display
    /// and tests.
    pub fn time_until_refresh(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_refresh(now)
    }
}
