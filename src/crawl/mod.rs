// src/crawl/mod.rs
// =============================================================================
// This module is the crawl engine.
//
// Features:
// - Concurrent crawling: one tokio task per page, siblings fetched in parallel
// - Each page fetched at most once, even when many tasks find it together
// - Configurable depth limit
// - Optional cap on fetches in flight, per-fetch timeout, and cancellation
//
// Submodules:
// - visited: the concurrent "already seen" set
// - counter: the outstanding-work counter used to detect completion
// - traverser: the crawl algorithm itself
// - record: what the crawl reports for each page
// - options: per-run settings and the cancel handle
// =============================================================================

mod counter;
mod options;
mod record;
mod traverser;
mod visited;

pub use counter::{WorkCounter, WorkGuard};
pub use options::{CancelHandle, CrawlOptions};
pub use record::{CrawlRecord, CrawlSummary};
pub use traverser::{collect, RecordSender, Traverser};
pub use visited::VisitedSet;
