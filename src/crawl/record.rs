// src/crawl/record.rs
// =============================================================================
// What the crawler reports while it runs.
//
// Every fetch produces exactly one CrawlRecord on the output channel: either
// the content that came back, or the error. Records arrive in whatever order
// the concurrent tasks finish, not in crawl order.
//
// JSON shape (via serde):
//   {"status": "fetched", "id": "https://a/", "content": "..."}
//   {"status": "failed",  "id": "https://b/", "error": "not found: https://b/"}
// =============================================================================

use crate::fetch::FetchError;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrawlRecord<I, C> {
    Fetched {
        id: I,
        content: C,
    },
    Failed {
        id: I,
        #[serde(serialize_with = "error_message")]
        error: FetchError,
    },
}

impl<I, C> CrawlRecord<I, C> {
    pub fn id(&self) -> &I {
        match self {
            Self::Fetched { id, .. } | Self::Failed { id, .. } => id,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

/// Totals for one finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Identifiers claimed through the visited set (fetched + failed, plus
    /// any claimed but not fetched because the run was cancelled).
    pub visited: usize,
    pub fetched: usize,
    pub failed: usize,
}

fn error_message<S: Serializer>(error: &FetchError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}
