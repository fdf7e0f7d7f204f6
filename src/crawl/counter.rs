// src/crawl/counter.rs
// =============================================================================
// The outstanding-work counter: how the crawler knows it is finished.
//
// The crawl has no idea up front how many pages it will visit, so it can't
// just join a fixed list of tasks. Instead:
//
// 1. Before a task is spawned, its parent calls `register()`, which bumps the
//    counter and hands back a WorkGuard.
// 2. The guard moves into the spawned task.
// 3. When the task ends (normally, early, or by panicking), the guard drops
//    and the counter goes down.
// 4. `wait_idle()` completes once the counter is back at zero.
//
// Because the parent registers a child before the parent's own guard can
// drop, the counter can't touch zero while any work is still pending.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct WorkCounter {
    outstanding: AtomicUsize,
    idle: Notify,
}

/// One registered unit of work. Dropping it marks the work as done.
#[derive(Debug)]
#[must_use = "dropping the guard immediately marks the work as finished"]
pub struct WorkGuard {
    counter: Arc<WorkCounter>,
}

impl WorkCounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(self: &Arc<Self>) -> WorkGuard {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        WorkGuard {
            counter: Arc::clone(self),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Waits until no registered work remains.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Enable before checking so a wake-up between the check and the
            // await is not lost.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        if self.counter.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.counter.idle.notify_waiters();
        }
    }
}
