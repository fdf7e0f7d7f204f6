// src/extract/mod.rs
// =============================================================================
// This module turns a downloaded document into the list of pages it links to.
//
// Submodules:
// - html: <a href> links and the <title> of HTML pages (scraper)
// - markdown: link destinations and the first heading of Markdown (pulldown-cmark)
//
// Both extractors hand every raw href to `resolve_link`, so relative links,
// fragments and non-web schemes are treated the same way no matter where
// the link came from.
// =============================================================================

mod html;
mod markdown;

pub use html::{extract_html_links, html_title};
pub use markdown::{extract_markdown_links, markdown_title};

use url::Url;

/// Resolves a (possibly relative) href against the page it appeared on.
///
/// Returns `None` for in-page anchors, `mailto:`/`tel:`/`javascript:` links,
/// anything that is not http(s), and hrefs that do not parse. The fragment is
/// dropped so `page#a` and `page#b` count as the same page.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    // join() also accepts absolute URLs, replacing the base entirely
    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

/// True when `link` points at the same host as `base`.
pub fn same_host(base: &Url, link: &str) -> bool {
    match Url::parse(link) {
        Ok(parsed) => parsed.host_str().is_some() && parsed.host_str() == base.host_str(),
        Err(_) => false,
    }
}
