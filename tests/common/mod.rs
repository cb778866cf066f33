#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use bankwatch::engine::RebuildOutcome;
use bankwatch::gate::ApprovalGate;

/// Test gate with externally controlled visibility/readiness.
#[derive(Debug, Default)]
pub struct FakeGate {
    visible: AtomicBool,
    ready: AtomicBool,
    pub shown: AtomicBool,
    pub results: Mutex<Vec<RebuildOutcome>>,
}

impl FakeGate {
    pub fn new(visible: bool, ready: bool) -> Self {
        Self {
            visible: AtomicBool::new(visible),
            ready: AtomicBool::new(ready),
            shown: AtomicBool::new(false),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl ApprovalGate for FakeGate {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn show(&self) {
        self.shown.store(true, Ordering::SeqCst);
    }

    fn handle_rebuild_result(&self, outcome: &RebuildOutcome) {
        self.results.lock().unwrap().push(*outcome);
    }
}
