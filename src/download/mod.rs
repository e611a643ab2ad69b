//! Download pipeline: scheduling, writing, and outcome accounting
//!
//! The traversal hands leaf resources to the [`Scheduler`], which runs at
//! most `parallel` writer tasks at a time. Writers stream response
//! bodies to disk (resuming partial files from a previous run) and report
//! a [`DownloadOutcome`], which the [`Reconciler`] logs and tallies.

mod reconciler;
mod scheduler;
mod writer;

pub use reconciler::Reconciler;
pub use scheduler::{PendingDownload, Scheduler};
pub use writer::{write, DownloadOutcome, WriteError};
