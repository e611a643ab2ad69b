//! Crawl engine for walking and mirroring a directory tree
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with resume-friendly headers
//! - Listing parsing and href extraction
//! - Depth-first traversal with scope and exclude filtering
//! - The crawl entry point and its end-of-run summary

mod fetcher;
mod parser;
mod traversal;

pub use fetcher::{build_http_client, fetch, fetch_range, is_html};
pub use parser::extract_hrefs;
pub use traversal::Traversal;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ScrapeConfig;
use crate::Result;

/// End-of-run counters for one crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Listing pages fetched and parsed
    pub pages: u64,

    /// Leaf resources handed to the download pool
    pub dispatched: u64,

    /// Files fully written this run, fresh or resumed
    pub downloaded: u64,

    /// Files skipped because the local copy was already complete
    pub already_complete: u64,

    /// Downloads that ended in an error
    pub failed: u64,

    /// URLs dropped by an exclude pattern before any fetch
    pub excluded: u64,

    /// Links discarded for leaving the base URL's subtree
    pub out_of_scope: u64,

    /// Fetches that failed outright or answered non-200
    pub fetch_errors: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Runs a complete scrape
///
/// This is the main entry point for mirroring a directory. It will:
/// 1. Build the HTTP client
/// 2. Walk the tree depth-first from the configured base URL
/// 3. Download every in-scope, non-excluded file it finds
/// 4. Drain outstanding downloads and return the run's counters
///
/// # Arguments
///
/// * `config` - The scrape configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Counters for the finished run
/// * `Err(ScrapeError)` - The HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// use odscrape::config::{ScrapeConfig, ScrapeOptions};
/// use odscrape::crawler::crawl;
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ScrapeConfig::from_options(ScrapeOptions {
///     url: "http://example.com/files/".to_string(),
///     output_dir: PathBuf::from("./mirror"),
///     parallel: 5,
///     delay_secs: 0,
///     exclude: vec![],
///     exclude_from: None,
///     clobber: false,
/// })?;
///
/// let summary = crawl(config).await?;
/// println!("downloaded {} files", summary.downloaded);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: ScrapeConfig) -> Result<CrawlSummary> {
    let client = build_http_client()?;
    let summary = Traversal::new(Arc::new(config), client).run().await;
    Ok(summary)
}
