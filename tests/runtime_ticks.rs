mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use bankwatch::engine::{
    RebuildOutcome, RebuildReason, Runtime, RuntimeEvent, RuntimeOptions,
};
use bankwatch::fs::mock::MockFileSystem;
use bankwatch::gate::{ApprovalGate, AutoGate, PromptGate};
use bankwatch::refresh::{CachePoll, CooldownScheduler, RefreshMode, FILE_POLL_PERIOD};
use bankwatch::watch::{SourceChangeFlag, SourceWatcher};

use common::FakeGate;

const CACHE: &str = "/proj/.bankwatch/cache";

struct Harness {
    runtime: Runtime,
    flag: Arc<SourceChangeFlag>,
    fs: MockFileSystem,
    exec_rx: mpsc::Receiver<RebuildReason>,
}

fn harness(cooldown_seconds: i64, gate: Arc<dyn ApprovalGate>, prompt_on_change: bool) -> Harness {
    let fs = MockFileSystem::new();
    fs.add_file(CACHE);

    let flag = Arc::new(SourceChangeFlag::new());
    let (_rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(8);
    let (exec_tx, exec_rx) = mpsc::channel::<RebuildReason>(8);

    let mode = RefreshMode::from_cooldown_seconds(cooldown_seconds).unwrap();
    let runtime = Runtime::new(
        CooldownScheduler::new(mode),
        CachePoll::new(CACHE),
        Arc::clone(&flag),
        gate,
        Arc::new(fs.clone()),
        RuntimeOptions {
            exit_after_rebuild: false,
            prompt_on_change,
            source_root: PathBuf::new(),
        },
        None,
        rt_rx,
        exec_tx,
    );

    Harness {
        runtime,
        flag,
        fs,
        exec_rx,
    }
}

#[tokio::test]
async fn change_burst_fires_exactly_one_rebuild_after_the_cooldown() {
    let mut h = harness(5, Arc::new(AutoGate), false);
    let t0 = Instant::now();

    // Many events between two ticks coalesce into one change.
    h.flag.mark_changed();
    h.flag.mark_changed();
    h.flag.mark_changed();

    h.runtime.tick(t0).await.unwrap();
    assert_eq!(
        h.runtime.time_until_refresh(t0),
        Some(Duration::from_secs(5))
    );
    assert!(h.exec_rx.try_recv().is_err());

    h.runtime.tick(t0 + Duration::from_secs(2)).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());

    h.runtime.tick(t0 + Duration::from_secs(5)).await.unwrap();
    assert_eq!(h.exec_rx.try_recv().unwrap(), RebuildReason::CooldownElapsed);

    // The pending change was reset: no re-fire without a new change.
    h.runtime.tick(t0 + Duration::from_secs(6)).await.unwrap();
    h.runtime.tick(t0 + Duration::from_secs(60)).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());
    assert_eq!(h.runtime.time_until_refresh(t0 + Duration::from_secs(6)), None);
}

#[tokio::test]
async fn a_tick_without_changes_does_not_arm_the_cooldown() {
    let mut h = harness(5, Arc::new(AutoGate), false);
    let t0 = Instant::now();

    h.runtime.tick(t0).await.unwrap();
    h.runtime.tick(t0 + Duration::from_secs(10)).await.unwrap();

    assert!(h.exec_rx.try_recv().is_err());
    assert_eq!(h.runtime.time_until_refresh(t0 + Duration::from_secs(10)), None);
}

#[tokio::test]
async fn missing_cache_triggers_once_per_poll_window() {
    let mut h = harness(5, Arc::new(AutoGate), false);
    h.fs.remove_file(CACHE);
    let t0 = Instant::now();

    h.runtime.tick(t0).await.unwrap();
    assert_eq!(h.exec_rx.try_recv().unwrap(), RebuildReason::CacheMissing);

    // Ticks inside the window stay quiet.
    h.runtime.tick(t0 + Duration::from_secs(1)).await.unwrap();
    h.runtime.tick(t0 + Duration::from_secs(4)).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());

    h.runtime.tick(t0 + FILE_POLL_PERIOD).await.unwrap();
    assert_eq!(h.exec_rx.try_recv().unwrap(), RebuildReason::CacheMissing);

    // Restoring the artifact silences the integrity check.
    h.fs.add_file(CACHE);
    h.runtime.tick(t0 + FILE_POLL_PERIOD * 2).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());
}

#[tokio::test]
async fn completion_resets_pending_state_for_success_and_failure() {
    let mut h = harness(5, Arc::new(AutoGate), false);
    let t0 = Instant::now();

    h.flag.mark_changed();
    h.runtime.tick(t0).await.unwrap();
    assert!(h.runtime.time_until_refresh(t0).is_some());

    let keep_running = h
        .runtime
        .handle_event(RuntimeEvent::RebuildCompleted {
            reason: RebuildReason::Manual,
            outcome: RebuildOutcome::Failed(2),
        })
        .await
        .unwrap();
    assert!(keep_running);

    // A failed rebuild is not retried: infinite until a new change arrives.
    assert_eq!(h.runtime.time_until_refresh(t0 + Duration::from_secs(10)), None);

    let t1 = t0 + Duration::from_secs(20);
    h.flag.mark_changed();
    h.runtime.tick(t1).await.unwrap();
    assert_eq!(
        h.runtime.time_until_refresh(t1),
        Some(Duration::from_secs(5))
    );
}

#[tokio::test]
async fn gate_blocks_the_elapsed_cooldown_until_ready() {
    let gate = Arc::new(FakeGate::new(true, false));
    let mut h = harness(1, Arc::clone(&gate) as Arc<dyn ApprovalGate>, false);
    let t0 = Instant::now();

    h.flag.mark_changed();
    h.runtime.tick(t0).await.unwrap();

    // Cooldown elapsed, gate not ready: nothing fires, state stays armed.
    h.runtime.tick(t0 + Duration::from_secs(2)).await.unwrap();
    h.runtime.tick(t0 + Duration::from_secs(3)).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());

    gate.set_ready(true);
    h.runtime.tick(t0 + Duration::from_secs(4)).await.unwrap();
    assert_eq!(h.exec_rx.try_recv().unwrap(), RebuildReason::CooldownElapsed);
}

#[tokio::test]
async fn disabled_auto_refresh_stays_off_while_the_prompt_is_visible() {
    let gate = Arc::new(FakeGate::new(true, false));
    let mut h = harness(1, Arc::clone(&gate) as Arc<dyn ApprovalGate>, true);
    let t0 = Instant::now();

    h.runtime
        .handle_event(RuntimeEvent::AutoRefreshDisabled)
        .await
        .unwrap();

    // Change while the prompt is on screen: cancel is not overridden.
    h.flag.mark_changed();
    h.runtime.tick(t0).await.unwrap();
    assert_eq!(h.runtime.time_until_refresh(t0 + Duration::from_secs(5)), None);
    assert!(h.exec_rx.try_recv().is_err());

    // Prompt gone, fresh change: auto-refresh re-arms.
    gate.set_visible(false);
    let t1 = t0 + Duration::from_secs(10);
    h.flag.mark_changed();
    h.runtime.tick(t1).await.unwrap();
    assert_eq!(
        h.runtime.time_until_refresh(t1),
        Some(Duration::from_secs(1))
    );
}

#[tokio::test]
async fn manual_mode_only_rebuilds_on_explicit_request() {
    let mut h = harness(-2, Arc::new(AutoGate), false);
    let t0 = Instant::now();

    h.flag.mark_changed();
    h.runtime.tick(t0).await.unwrap();
    h.runtime.tick(t0 + Duration::from_secs(3600)).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());

    h.runtime
        .handle_event(RuntimeEvent::ManualRefresh)
        .await
        .unwrap();
    assert_eq!(h.exec_rx.try_recv().unwrap(), RebuildReason::Manual);
}

#[tokio::test]
async fn prompt_mode_fires_on_approval_and_notifies_the_gate() {
    let gate = Arc::new(PromptGate::new());
    let mut h = harness(-1, Arc::clone(&gate) as Arc<dyn ApprovalGate>, true);
    let t0 = Instant::now();

    h.flag.mark_changed();
    h.runtime.tick(t0).await.unwrap();
    assert!(gate.is_visible());

    // No automatic cooldown in prompt mode, no matter how long we wait.
    h.runtime.tick(t0 + Duration::from_secs(3600)).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());

    gate.approve();
    h.runtime
        .handle_event(RuntimeEvent::PromptApproved)
        .await
        .unwrap();
    assert_eq!(h.exec_rx.try_recv().unwrap(), RebuildReason::Approved);

    // Approval is consumed: a second one without a new change does nothing.
    h.runtime
        .handle_event(RuntimeEvent::PromptApproved)
        .await
        .unwrap();
    assert!(h.exec_rx.try_recv().is_err());

    // Completion resets the gate for the next change.
    h.runtime
        .handle_event(RuntimeEvent::RebuildCompleted {
            reason: RebuildReason::Approved,
            outcome: RebuildOutcome::Success,
        })
        .await
        .unwrap();
    assert!(!gate.is_visible());
    assert!(gate.is_ready());
}

#[tokio::test]
async fn declined_prompt_disables_auto_refresh_until_the_next_change() {
    let gate = Arc::new(PromptGate::new());
    let mut h = harness(2, Arc::clone(&gate) as Arc<dyn ApprovalGate>, true);
    let t0 = Instant::now();

    h.flag.mark_changed();
    h.runtime.tick(t0).await.unwrap();
    assert!(gate.is_visible());

    // User answers "n": the console dismisses the gate and the runtime is
    // told to disable auto-refresh.
    gate.dismiss();
    h.runtime
        .handle_event(RuntimeEvent::AutoRefreshDisabled)
        .await
        .unwrap();

    h.runtime.tick(t0 + Duration::from_secs(10)).await.unwrap();
    assert!(h.exec_rx.try_recv().is_err());

    // A fresh change while the prompt is hidden re-arms auto-refresh.
    let t1 = t0 + Duration::from_secs(20);
    h.flag.mark_changed();
    h.runtime.tick(t1).await.unwrap();
    assert!(gate.is_visible());
    h.runtime.tick(t1 + Duration::from_secs(2)).await.unwrap();
    // Gate visible and unanswered, so the elapsed cooldown is still blocked.
    assert!(h.exec_rx.try_recv().is_err());

    gate.approve();
    h.runtime.tick(t1 + Duration::from_secs(3)).await.unwrap();
    assert_eq!(h.exec_rx.try_recv().unwrap(), RebuildReason::CooldownElapsed);
}

#[tokio::test]
async fn exit_after_rebuild_stops_the_loop_on_completion() {
    let fs = MockFileSystem::new();
    fs.add_file(CACHE);

    let flag = Arc::new(SourceChangeFlag::new());
    let (_rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(8);
    let (exec_tx, _exec_rx) = mpsc::channel::<RebuildReason>(8);

    let mut runtime = Runtime::new(
        CooldownScheduler::new(RefreshMode::from_cooldown_seconds(5).unwrap()),
        CachePoll::new(CACHE),
        flag,
        Arc::new(AutoGate),
        Arc::new(fs),
        RuntimeOptions {
            exit_after_rebuild: true,
            prompt_on_change: false,
            source_root: PathBuf::new(),
        },
        None,
        rt_rx,
        exec_tx,
    );

    let keep_running = runtime
        .handle_event(RuntimeEvent::RebuildCompleted {
            reason: RebuildReason::Manual,
            outcome: RebuildOutcome::Success,
        })
        .await
        .unwrap();
    assert!(!keep_running);
}

#[tokio::test]
async fn relative_watch_paths_resolve_against_the_source_root() {
    let root = tempfile::tempdir().unwrap();
    let banks = root.path().join("Banks");
    std::fs::create_dir(&banks).unwrap();

    let fs = MockFileSystem::new();
    fs.add_file(CACHE);

    let flag = Arc::new(SourceChangeFlag::new());
    let (_rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(8);
    let (exec_tx, _exec_rx) = mpsc::channel::<RebuildReason>(8);

    let watcher = SourceWatcher::new(Arc::clone(&flag)).unwrap();

    let mut runtime = Runtime::new(
        CooldownScheduler::new(RefreshMode::from_cooldown_seconds(5).unwrap()),
        CachePoll::new(CACHE),
        flag,
        Arc::new(AutoGate),
        Arc::new(fs),
        RuntimeOptions {
            exit_after_rebuild: false,
            prompt_on_change: false,
            source_root: root.path().to_path_buf(),
        },
        Some(watcher),
        rt_rx,
        exec_tx,
    );

    // Same resolution rule as the configured source path: relative to the
    // config file's directory, not the process cwd.
    runtime
        .handle_event(RuntimeEvent::SourcePathChanged(PathBuf::from("Banks")))
        .await
        .unwrap();

    let expected = banks.canonicalize().unwrap();
    assert_eq!(runtime.watched_source_path(), Some(expected.as_path()));
}

#[tokio::test]
async fn source_path_change_without_a_watcher_is_ignored() {
    let mut h = harness(5, Arc::new(AutoGate), false);

    let keep_running = h
        .runtime
        .handle_event(RuntimeEvent::SourcePathChanged("/elsewhere".into()))
        .await
        .unwrap();
    assert!(keep_running);
}
