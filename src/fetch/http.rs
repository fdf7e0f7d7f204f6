// src/fetch/http.rs
// =============================================================================
// This module is the real-world fetch backend: it downloads a page over HTTP
// and reports the links found on it.
//
// Key functionality:
// - One shared reqwest Client (connection pooling across all crawl tasks)
// - Non-2xx responses become FetchErrors (404/410 -> NotFound)
// - HTML pages are parsed with scraper, Markdown documents with pulldown-cmark
// - Optional same-host restriction so a crawl doesn't wander off the site
//
// Rust concepts:
// - Implementing a trait from another module (Fetcher)
// - Mapping foreign errors (reqwest::Error) into our own error type
// =============================================================================

use super::{FetchError, Fetched, Fetcher};
use crate::extract::{
    extract_html_links, extract_markdown_links, html_title, markdown_title, same_host,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// What the HTTP fetcher reports about a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub bytes: usize,
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{} ({} bytes)", title, self.bytes),
            None => write!(f, "({} bytes)", self.bytes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    // When set, links to any other host are not reported as children
    restrict_to: Option<Url>,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            restrict_to: None,
        })
    }

    /// Only follow links that stay on the same host as `start`.
    pub fn same_host_as(mut self, start: &Url) -> Self {
        self.restrict_to = Some(start.clone());
        self
    }

    fn keep_link(&self, link: &str) -> bool {
        match &self.restrict_to {
            Some(start) => same_host(start, link),
            None => true,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    type Id = String;
    type Content = PageSummary;

    async fn fetch(&self, url: &String) -> Result<Fetched<String, PageSummary>, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Err(FetchError::NotFound(url.clone()));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        // Resolve relative links against where we actually ended up after redirects
        let page_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(categorize_error)?;

        let (title, links) = if is_markdown(&page_url, content_type.as_deref()) {
            (markdown_title(&body), extract_markdown_links(&body, &page_url))
        } else {
            (html_title(&body), extract_html_links(&body, &page_url))
        };

        Ok(Fetched {
            content: PageSummary {
                title,
                bytes: body.len(),
            },
            children: links.into_iter().filter(|link| self.keep_link(link)).collect(),
        })
    }
}

fn is_markdown(url: &Url, content_type: Option<&str>) -> bool {
    let by_header =
        content_type.is_some_and(|value| value.trim_start().starts_with("text/markdown"));
    let path = url.path().to_ascii_lowercase();

    by_header || path.ends_with(".md") || path.ends_with(".markdown")
}

// Maps reqwest errors onto FetchError
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout;
    }

    let error_string = error.to_string();
    let message = if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() && error_string.contains("dns") {
        "could not resolve hostname".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "SSL certificate error".to_string()
    } else {
        error_string
    };

    FetchError::Transport(message)
}
