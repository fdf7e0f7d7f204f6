// src/main.rs
// =============================================================================
// This is the entry point of the link-spider CLI.
//
// What happens here:
// 1. Set up logging (tracing events from the library go to stderr)
// 2. Parse command-line arguments using clap
// 3. Build a fetcher and run the crawl
// 4. Print the records as a table or JSON
// 5. Exit with proper code (0 = all pages fetched, 1 = some failed, 2 = error)
//
// Ctrl-C stops the crawl early: no new pages are fetched, pages already in
// flight finish, and the partial results are printed as usual.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use link_spider::{
    collect, CancelHandle, CrawlOptions, CrawlRecord, CrawlSummary, HttpFetcher, MapFetcher,
};
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("link_spider=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let cancel = CancelHandle::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, waiting for in-flight fetches");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Commands::Crawl {
            url,
            max_depth,
            concurrency,
            timeout,
            all_domains,
            json,
        } => {
            let start = Url::parse(&url).with_context(|| format!("invalid URL '{url}'"))?;
            let mut fetcher = HttpFetcher::new(Duration::from_secs(timeout))?;
            if !all_domains {
                fetcher = fetcher.same_host_as(&start);
            }

            let mut options = CrawlOptions::new().with_cancel(cancel);
            if let Some(limit) = concurrency {
                options = options.with_max_concurrent_fetches(limit);
            }

            if !json {
                println!("🔍 Crawling: {start}");
                println!("📊 Max depth: {max_depth}");
            }
            let (records, summary) = collect(fetcher, start.to_string(), max_depth, options).await;
            report(&records, summary, json)
        }
        Commands::Demo {
            max_depth,
            site,
            root,
            json,
        } => {
            let (fetcher, root) = match (site, root) {
                (Some(path), Some(root)) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let fetcher = MapFetcher::from_json(&text)
                        .with_context(|| format!("failed to parse {}", path.display()))?;
                    (fetcher, root)
                }
                (_, root) => (
                    MapFetcher::sample_site(),
                    root.unwrap_or_else(|| "https://golang.org/".to_string()),
                ),
            };

            if !json {
                println!("🔍 Crawling in-memory site from: {root}");
                println!("📊 Max depth: {max_depth}");
            }
            let options = CrawlOptions::new().with_cancel(cancel);
            let (records, summary) = collect(fetcher, root, max_depth, options).await;
            report(&records, summary, json)
        }
    }
}

// Prints the records and turns the outcome into an exit code
fn report<C: Display + Serialize>(
    records: &[CrawlRecord<String, C>],
    summary: CrawlSummary,
    json: bool,
) -> Result<i32> {
    if json {
        let output = serde_json::to_string_pretty(records)?;
        println!("{output}");
    } else {
        print_table(records, summary);
    }

    Ok(if summary.failed > 0 { 1 } else { 0 })
}

fn print_table<C: Display>(records: &[CrawlRecord<String, C>], summary: CrawlSummary) {
    println!();
    println!("{:<60} {:<12} {:<40}", "URL", "STATUS", "DETAIL");
    println!("{}", "=".repeat(112));

    for record in records {
        let (status, detail) = match record {
            CrawlRecord::Fetched { content, .. } => ("✅ OK", content.to_string()),
            CrawlRecord::Failed { error, .. } => ("❌ FAILED", error.to_string()),
        };

        // Truncate URL if too long for display
        let url = record.id();
        let url_display = if url.chars().count() > 57 {
            format!("{}...", url.chars().take(57).collect::<String>())
        } else {
            url.clone()
        };

        println!("{:<60} {:<12} {:<40}", url_display, status, detail);
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Fetched: {}", summary.fetched);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   📋 Visited: {}", summary.visited);
}
