// src/crawl/options.rs
// Knobs for a single crawl run, plus the handle used to stop one early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Upper bound on fetches in flight. `None` (or 0) means unbounded.
    pub max_concurrent_fetches: Option<usize>,
    /// A fetch still running after this long is recorded as timed out.
    pub fetch_timeout: Option<Duration>,
    pub cancel: Option<CancelHandle>,
}

impl CrawlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = Some(limit);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Shared stop flag. Clones observe the same flag.
///
/// Crawl tasks check it before claiming a page and again right before
/// fetching; once set, no new fetch starts.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
