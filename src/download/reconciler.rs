//! Download outcome accounting
//!
//! Every finished download passes through [`Reconciler::record`] exactly
//! once: it logs the outcome at the appropriate level and bumps a tally.
//! Recording never fails, so a bad download can never take the crawl down
//! with it.

use crate::download::writer::DownloadOutcome;

/// Tallies download outcomes as they are reconciled
#[derive(Debug, Default)]
pub struct Reconciler {
    succeeded: u64,
    already_complete: u64,
    failed: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs one outcome and folds it into the tallies
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success { url, dest } => {
                tracing::info!("Downloaded {} -> {}", url, dest.display());
                self.succeeded += 1;
            }
            DownloadOutcome::AlreadyComplete { url } => {
                tracing::info!("Already complete: {}", url);
                self.already_complete += 1;
            }
            DownloadOutcome::Failure { url, error } => {
                tracing::error!("Download of {} failed: {}", url, error);
                self.failed += 1;
            }
        }
    }

    /// Files fully written this run, fresh or resumed
    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    /// Files skipped because the local copy already matched the remote length
    pub fn already_complete(&self) -> u64 {
        self.already_complete
    }

    /// Downloads that ended in an error
    pub fn failed(&self) -> u64 {
        self.failed
    }
}
