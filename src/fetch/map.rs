// src/fetch/map.rs
// =============================================================================
// An in-memory fetcher: every "page" lives in a HashMap keyed by URL.
//
// Used for:
// - the `demo` subcommand (a small copy of the golang.org site layout)
// - loading a site description from a JSON file
// - every traversal test, since tests must not touch the network
//
// Looking up a URL that is not in the map fails with FetchError::NotFound,
// exactly like a 404 would for the HTTP fetcher.
// =============================================================================

use super::{FetchError, Fetched, Fetcher};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One page of an in-memory site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub body: String,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapFetcher {
    pages: HashMap<String, Page>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a page, builder style.
    pub fn with_page<S: Into<String>>(mut self, url: S, body: S, links: &[&str]) -> Self {
        self.insert(url, body, links);
        self
    }

    pub fn insert<S: Into<String>>(&mut self, url: S, body: S, links: &[&str]) {
        let page = Page {
            body: body.into(),
            links: links.iter().map(|link| link.to_string()).collect(),
        };
        self.pages.insert(url.into(), page);
    }

    /// Parses a site from JSON of the form
    /// `{"https://a/": {"body": "...", "links": ["https://b/"]}}`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// A miniature golang.org: four pages linking to each other in cycles,
    /// plus a link to `/cmd/` that does not exist.
    pub fn sample_site() -> Self {
        Self::new()
            .with_page(
                "https://golang.org/",
                "The Go Programming Language",
                &["https://golang.org/pkg/", "https://golang.org/cmd/"],
            )
            .with_page(
                "https://golang.org/pkg/",
                "Packages",
                &[
                    "https://golang.org/",
                    "https://golang.org/cmd/",
                    "https://golang.org/pkg/fmt/",
                    "https://golang.org/pkg/os/",
                ],
            )
            .with_page(
                "https://golang.org/pkg/fmt/",
                "Package fmt",
                &["https://golang.org/", "https://golang.org/pkg/"],
            )
            .with_page(
                "https://golang.org/pkg/os/",
                "Package os",
                &["https://golang.org/", "https://golang.org/pkg/"],
            )
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    type Id = String;
    type Content = String;

    async fn fetch(&self, url: &String) -> Result<Fetched<String, String>, FetchError> {
        self.pages
            .get(url)
            .map(|page| Fetched {
                content: page.body.clone(),
                children: page.links.clone(),
            })
            .ok_or_else(|| FetchError::NotFound(url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_known_page() {
        let site = MapFetcher::sample_site();
        let page = site.fetch(&"https://golang.org/".to_string()).await.unwrap();
        assert_eq!(page.content, "The Go Programming Language");
        assert_eq!(
            page.children,
            vec!["https://golang.org/pkg/", "https://golang.org/cmd/"]
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_page() {
        let site = MapFetcher::sample_site();
        let err = site
            .fetch(&"https://golang.org/cmd/".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::NotFound("https://golang.org/cmd/".to_string()));
        assert_eq!(err.to_string(), "not found: https://golang.org/cmd/");
    }

    #[test]
    fn test_from_json() {
        let site = MapFetcher::from_json(
            r#"{
                "https://a.test/": {"body": "A", "links": ["https://b.test/"]},
                "https://b.test/": {"body": "B"}
            }"#,
        )
        .unwrap();
        assert_eq!(site.len(), 2);
        assert_eq!(
            site,
            MapFetcher::new()
                .with_page("https://a.test/", "A", &["https://b.test/"])
                .with_page("https://b.test/", "B", &[])
        );
    }
}
