// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod gate;
pub mod logging;
pub mod refresh;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeEvent, RuntimeOptions};
use crate::fs::RealFileSystem;
use crate::gate::{ApprovalGate, AutoGate, PromptGate};
use crate::refresh::{CachePoll, CooldownScheduler, RefreshMode};
use crate::watch::{SourceChangeFlag, SourceWatcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - cooldown scheduler / cache poll / runtime
/// - rebuild executor
/// - (optional) file watcher and approval prompt
/// - console command loop and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root_dir = config_root_dir(&config_path);
    let mode = RefreshMode::from_cooldown_seconds(cfg.refresh.cooldown_seconds)?;
    let prompt_on_change = mode.prompts_on_change(cfg.refresh.show_prompt);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Rebuild executor.
    let exec_tx = exec::spawn_rebuild_executor(cfg.rebuild.cmd.clone(), rt_tx.clone());

    // Change detector state shared with the notify callback thread.
    let flag = Arc::new(SourceChangeFlag::new());

    // Optional file watcher (disabled in --once mode).
    let watcher = if !args.once {
        // An empty configured path stays empty: it means "monitoring disabled",
        // not "watch the project root".
        let source_path = if cfg.source.path.is_empty() {
            PathBuf::new()
        } else {
            root_dir.join(&cfg.source.path)
        };

        let mut watcher = SourceWatcher::new(Arc::clone(&flag))?;
        watcher.set_path(&source_path);
        Some(watcher)
    } else {
        None
    };

    // Approval gate + console loop. The console runs even without a prompt so
    // manual refresh / shutdown commands work in every mode.
    let gate: Arc<dyn ApprovalGate> = if prompt_on_change {
        let prompt = Arc::new(PromptGate::new());
        console::spawn_console(Some(Arc::clone(&prompt)), rt_tx.clone());
        prompt
    } else {
        console::spawn_console(None, rt_tx.clone());
        Arc::new(AutoGate)
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // One-shot mode: rebuild immediately, exit on completion.
    if args.once {
        info!("one-shot mode: triggering a single rebuild");
        rt_tx.send(RuntimeEvent::ManualRefresh).await?;
    }

    let scheduler = CooldownScheduler::new(mode);
    let poll = CachePoll::new(root_dir.join(&cfg.rebuild.cache_file));
    let options = RuntimeOptions {
        exit_after_rebuild: args.once,
        prompt_on_change,
        source_root: root_dir,
    };

    let runtime = Runtime::new(
        scheduler,
        poll,
        flag,
        gate,
        Arc::new(RealFileSystem),
        options,
        watcher,
        rt_rx,
        exec_tx,
    );
    runtime.run().await
}

/// Figure out a sensible project root for resolving relative paths.
/// Currently: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("bankwatch dry-run");
    println!("  source.path = {}", cfg.source.path);
    println!(
        "  refresh.cooldown_seconds = {}{}",
        cfg.refresh.cooldown_seconds,
        match cfg.refresh.cooldown_seconds {
            refresh::PROMPT_COOLDOWN => " (prompt before refresh)",
            refresh::MANUAL_COOLDOWN => " (manual only)",
            _ => "",
        }
    );
    println!("  refresh.show_prompt = {}", cfg.refresh.show_prompt);
    println!("  rebuild.cmd = {}", cfg.rebuild.cmd);
    println!("  rebuild.cache_file = {}", cfg.rebuild.cache_file);

    debug!("dry-run complete (no execution)");
}
