// src/lib.rs
// =============================================================================
// link-spider: a concurrent, depth-bounded crawler.
//
// Start at one page, fetch it, follow its links in parallel, and never fetch
// the same page twice. The engine is generic over a `Fetcher`, so it can
// crawl a live website (HttpFetcher) or an in-memory site (MapFetcher).
//
// Example:
//   let (records, summary) =
//       collect(MapFetcher::sample_site(), "https://golang.org/".into(), 4, CrawlOptions::new()).await;
// =============================================================================

pub mod crawl;
pub mod extract;
pub mod fetch;

pub use crawl::{
    collect, CancelHandle, CrawlOptions, CrawlRecord, CrawlSummary, Traverser, VisitedSet,
};
pub use fetch::{FetchError, Fetched, Fetcher, HttpFetcher, MapFetcher, Page, PageSummary};
