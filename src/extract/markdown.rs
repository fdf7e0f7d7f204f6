// src/extract/markdown.rs
// =============================================================================
// This module extracts links and the first heading from Markdown text.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Is a streaming parser, so we never build a full document tree
//
// Unlike a link checker, a crawler wants relative links too (README.md ->
// docs/guide.md), so every destination is resolved against the page URL.
// =============================================================================

use super::resolve_link;
use pulldown_cmark::{Event, Parser, Tag};
use url::Url;

// Extracts all crawlable link destinations from Markdown text
//
// Example:
//   markdown = "See [guide](docs/guide.md) and [Rust](https://www.rust-lang.org)"
//   base     = "https://example.com/README.md"
//   result   = ["https://example.com/docs/guide.md", "https://www.rust-lang.org/"]
pub fn extract_markdown_links(markdown: &str, base: &Url) -> Vec<String> {
    Parser::new(markdown)
        .filter_map(|event| match event {
            // In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
            Event::Start(Tag::Link(_link_type, dest_url, _title)) => {
                resolve_link(base, &dest_url)
            }
            _ => None,
        })
        .collect()
}

/// Plain text of the first heading in the document.
pub fn markdown_title(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut title = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading(..)) => in_heading = true,
            Event::End(Tag::Heading(..)) => break,
            Event::Text(text) | Event::Code(text) if in_heading => title.push_str(&text),
            _ => {}
        }
    }

    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
