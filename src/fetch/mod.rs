// src/fetch/mod.rs
// =============================================================================
// This module defines the "fetch capability" the crawler is built around.
//
// The traversal engine (src/crawl/) never talks to the network itself. It asks
// a Fetcher: "here is an identifier, give me its content and its children".
// That keeps the engine testable (tests use an in-memory map) and lets the same
// engine crawl websites, file trees, or anything else shaped like a graph.
//
// Submodules:
// - map: in-memory fetcher backed by a HashMap (demo site + tests)
// - http: real fetcher that downloads pages with reqwest
//
// Rust concepts:
// - Traits with associated types: each fetcher picks its Id and Content types
// - async-trait: async methods in a trait whose futures are Send
// - thiserror: deriving std::error::Error for our error enum
// =============================================================================

mod http;
mod map;

use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

pub use http::{HttpFetcher, PageSummary};
pub use map::{MapFetcher, Page};

/// What a successful fetch returns: the payload plus the identifiers it links to.
///
/// `children` keeps the order the source produced and may contain duplicates
/// or identifiers that were already visited. The crawler filters those itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<I, C> {
    pub content: C,
    pub children: Vec<I>,
}

/// The one kind of failure a fetch can report.
///
/// The variants only exist to give a useful message; the crawler treats every
/// variant the same way (record it, stop that branch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("HTTP {status}")]
    Http { status: u16 },
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{0}")]
    Other(String),
}

/// Something that can turn an identifier into content and child identifiers.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Identifier of a node, e.g. a URL string.
    type Id: Eq + Hash + Clone + Debug + Send + Sync + 'static;
    /// Opaque payload handed back to the caller through crawl records.
    type Content: Send + 'static;

    async fn fetch(&self, id: &Self::Id) -> Result<Fetched<Self::Id, Self::Content>, FetchError>;
}
