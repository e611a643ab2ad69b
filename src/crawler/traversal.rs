//! Depth-first traversal of the remote directory tree
//!
//! This module contains the walk itself:
//! - Visiting each URL exactly once, recorded before the fetch goes out
//! - Branching on Content-Type: listings recurse, files dispatch
//! - Scope containment and exclude filtering before any network work
//! - Collecting the per-run counters into a [`CrawlSummary`]
//!
//! The traversal is one logical flow. Children of a listing are visited
//! depth-first, each fully explored before the next sibling; only the
//! download pool below the scheduler runs in parallel. That sequencing is
//! what makes the unsynchronized visited set safe: no two visits are ever
//! in flight at once, so check-then-insert cannot race. A rework that
//! explores listings concurrently must revisit that assumption.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::config::ScrapeConfig;
use crate::crawler::{fetcher, parser, CrawlSummary};
use crate::download::{PendingDownload, Scheduler};
use crate::url::{decoded_suffix, in_scope, resolve};

/// One crawl run's worth of state
///
/// Owns everything the walk touches: the visited set, the scheduler, and
/// the counters. Nothing is process-global, so independent crawls can run
/// in the same process without sharing state.
pub struct Traversal {
    config: Arc<ScrapeConfig>,
    client: Client,
    scheduler: Scheduler,
    visited: HashSet<String>,
    pages: u64,
    dispatched: u64,
    excluded: u64,
    out_of_scope: u64,
    fetch_errors: u64,
}

impl Traversal {
    /// Creates a traversal for one run over `config`
    pub fn new(config: Arc<ScrapeConfig>, client: Client) -> Self {
        let scheduler = Scheduler::new(Arc::clone(&config), client.clone());

        Self {
            config,
            client,
            scheduler,
            visited: HashSet::new(),
            pages: 0,
            dispatched: 0,
            excluded: 0,
            out_of_scope: 0,
            fetch_errors: 0,
        }
    }

    /// Walks the tree from the base URL and drains every download
    ///
    /// Consumes the traversal; the crawl is a one-shot. Returns the run's
    /// counters after the last download has been reconciled.
    pub async fn run(mut self) -> CrawlSummary {
        let start_time = Instant::now();
        let base = self.config.base_url.clone();

        self.visit(base).await;
        self.scheduler.drain().await;

        let reconciler = self.scheduler.reconciler();
        let summary = CrawlSummary {
            pages: self.pages,
            dispatched: self.dispatched,
            downloaded: reconciler.succeeded(),
            already_complete: reconciler.already_complete(),
            failed: reconciler.failed(),
            excluded: self.excluded,
            out_of_scope: self.out_of_scope,
            fetch_errors: self.fetch_errors,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl completed: {} listings, {} downloaded, {} already complete, {} failed in {:?}",
            summary.pages,
            summary.downloaded,
            summary.already_complete,
            summary.failed,
            summary.elapsed
        );

        summary
    }

    /// Visits one URL: the per-node state machine
    ///
    /// Recursion happens through [`Self::visit_listing`], so the future is
    /// boxed here to give the recursive chain a known size. Every network
    /// problem is absorbed at this level; a bad branch never unwinds the
    /// walk.
    fn visit(&mut self, url: Url) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            // Recorded before the fetch, so a listing that links back to an
            // ancestor mid-flight still sees it as taken.
            self.visited.insert(url.as_str().to_string());

            if let Some(suffix) = decoded_suffix(&url, &self.config.base_url) {
                if let Some(pattern) = self.config.excludes.matched(&suffix) {
                    tracing::info!("Excluded {} (pattern {})", url, pattern);
                    self.excluded += 1;
                    return;
                }
            }

            let response = match fetcher::fetch(&self.client, &url).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("Fetch of {} failed: {}", url, e);
                    self.fetch_errors += 1;
                    return;
                }
            };

            let status = response.status();
            if status != StatusCode::OK {
                tracing::warn!("Skipping {}: HTTP {}", url, status.as_u16());
                self.fetch_errors += 1;
                return;
            }

            if fetcher::is_html(&response) {
                self.visit_listing(url, response).await;
            } else {
                self.dispatch_leaf(url, response).await;
            }
        })
    }

    /// Parses a listing page and recurses into its unseen in-scope children
    async fn visit_listing(&mut self, url: Url, response: Response) {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Reading listing {} failed: {}", url, e);
                self.fetch_errors += 1;
                return;
            }
        };

        self.pages += 1;
        tracing::debug!("Parsing listing {}", url);
        if self.pages % 10 == 0 {
            tracing::info!(
                "Progress: {} listings visited, {} downloads dispatched",
                self.pages,
                self.dispatched
            );
        }

        for href in parser::extract_hrefs(&body) {
            let child = match resolve(&url, &href) {
                Ok(child) => child,
                Err(e) => {
                    tracing::debug!("Ignoring href {:?} on {}: {}", href, url, e);
                    continue;
                }
            };

            if !in_scope(&child, &self.config.base_url) {
                // Listings always link back to their parent; this is where
                // that link (and anything else leaving the tree) dies.
                tracing::info!("Out of scope: {}", child);
                self.out_of_scope += 1;
                continue;
            }

            if self.visited.contains(child.as_str()) {
                continue;
            }

            self.visit(child).await;
        }
    }

    /// Maps a leaf URL onto the mirror and hands it to the scheduler
    ///
    /// Dispatch suspends when all download permits are taken, which is the
    /// only backpressure between the walk and the writer pool.
    async fn dispatch_leaf(&mut self, url: Url, response: Response) {
        let suffix = match decoded_suffix(&url, &self.config.base_url) {
            Some(suffix) => suffix,
            None => {
                // Unreachable for URLs admitted by the scope filter.
                tracing::warn!("No scope suffix for {}", url);
                return;
            }
        };

        // A suffix with a leading '/' would replace the root on join
        // instead of descending into it.
        let dest = self.config.output_root.join(suffix.trim_start_matches('/'));

        tracing::debug!("Dispatching {} -> {}", url, dest.display());
        self.dispatched += 1;
        self.scheduler
            .dispatch(PendingDownload { url, response, dest })
            .await;
    }
}
