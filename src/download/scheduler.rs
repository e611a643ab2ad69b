//! Bounded download scheduling
//!
//! A counting semaphore is the sole admission control for downloads:
//! [`Scheduler::dispatch`] suspends the traversal once the configured
//! number of writer tasks is live, and every dispatch opportunistically
//! reconciles whatever has finished, so outcomes are logged while the
//! crawl is still walking the tree. The permit and the task pool together
//! form a fixed-size worker pool: at most `parallel` writers ever run.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::{Client, Response};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use url::Url;

use crate::config::ScrapeConfig;
use crate::download::reconciler::Reconciler;
use crate::download::writer::{self, DownloadOutcome};

/// A leaf resource ready to be written into the mirror
///
/// Carries the already-open response so the writer can stream it without a
/// second request, or drop it unread when the file turns out to be
/// resumable.
#[derive(Debug)]
pub struct PendingDownload {
    /// Canonical URL of the resource
    pub url: Url,

    /// The open response whose headers have been inspected
    pub response: Response,

    /// Destination path, output root joined with the decoded suffix
    pub dest: PathBuf,
}

/// Dispatches downloads onto a permit-bounded task pool
pub struct Scheduler {
    config: Arc<ScrapeConfig>,
    client: Client,
    permits: Arc<Semaphore>,
    in_flight: JoinSet<DownloadOutcome>,
    reconciler: Reconciler,
}

impl Scheduler {
    /// Creates a scheduler bounded at `config.parallel` concurrent downloads
    pub fn new(config: Arc<ScrapeConfig>, client: Client) -> Self {
        let permits = Arc::new(Semaphore::new(config.parallel));

        Self {
            config,
            client,
            permits,
            in_flight: JoinSet::new(),
            reconciler: Reconciler::new(),
        }
    }

    /// Hands a pending download to the writer pool
    ///
    /// Suspends until a permit is free; this backpressure is what keeps
    /// the traversal from outrunning the download limit. The caller is
    /// never blocked on a *specific* download, only on a free slot. The
    /// permit moves into the spawned task and drops when the task ends,
    /// on every path including a panic.
    pub async fn dispatch(&mut self, pending: PendingDownload) {
        let permit = match self.permits.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => {
                // The semaphore is never closed, but the type demands an answer.
                tracing::error!("Download permits unavailable, dropping {}", pending.url);
                return;
            }
        };

        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        self.in_flight.spawn(async move {
            let _permit = permit;
            writer::write(&client, &config, pending).await
        });

        self.sweep();
    }

    /// Reconciles every download that has already finished, without blocking
    pub fn sweep(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            self.reconcile(joined);
        }
    }

    /// Waits for all remaining downloads and reconciles them
    pub async fn drain(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            self.reconcile(joined);
        }
    }

    fn reconcile(&mut self, joined: Result<DownloadOutcome, JoinError>) {
        match joined {
            Ok(outcome) => self.reconciler.record(outcome),
            Err(e) => tracing::error!("Download task panicked: {}", e),
        }
    }

    /// Outcome tallies recorded so far
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }
}
