// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Subcommands:
// - crawl: crawl a live website over HTTP
// - demo: crawl a built-in (or JSON-described) in-memory site, no network
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-spider",
    version,
    about = "Crawl a site concurrently, visiting every page at most once",
    long_about = "link-spider starts from one URL, follows links in parallel down to a maximum depth, \
                  and reports every page it fetched or failed to fetch. \
                  Set RUST_LOG=link_spider=debug to watch the crawl as it happens."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from a URL
    ///
    /// Example: link-spider crawl https://example.com --max-depth 3
    Crawl {
        /// URL to start from (e.g., https://example.com)
        url: String,

        /// How many levels to fetch (1 = just the starting page)
        #[arg(long, default_value_t = 2)]
        max_depth: usize,

        /// Maximum number of requests in flight (default: unlimited)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Give up on a single page after this many seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Follow links to other hosts too
        #[arg(long)]
        all_domains: bool,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Crawl an in-memory site (no network access)
    ///
    /// Example: link-spider demo --max-depth 4
    Demo {
        /// How many levels to fetch (1 = just the starting page)
        #[arg(long, default_value_t = 4)]
        max_depth: usize,

        /// JSON file describing the site: {"url": {"body": "...", "links": [...]}}
        #[arg(long, requires = "root")]
        site: Option<PathBuf>,

        /// Page to start from when using --site
        #[arg(long)]
        root: Option<String>,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}
