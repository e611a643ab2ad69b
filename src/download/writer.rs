//! Resumable file writer
//!
//! Maps a fetched leaf resource onto the local mirror and streams its bytes
//! to disk. Existing files are resumed with a byte-range request keyed off
//! the remote Content-Length; an equal size means the file is already
//! complete and nothing is transferred.

use std::path::{Component, Path, PathBuf};

use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::config::ScrapeConfig;
use crate::crawler::fetch_range;
use crate::download::scheduler::PendingDownload;

/// Per-file download errors, carried inside [`DownloadOutcome::Failure`]
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("destination {} escapes output root {}", .dest.display(), .root.display())]
    PathEscape { dest: PathBuf, root: PathBuf },

    #[error("remote did not report a content length")]
    MissingLength,

    #[error("local file is larger than the remote resource ({local} > {remote} bytes); re-run with --clobber to replace it")]
    RangeNotSatisfiable { local: u64, remote: u64 },

    #[error("range request answered with HTTP {status} instead of 206")]
    RangeStatus { status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Terminal classification of one dispatched download
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Bytes were written (fresh, clobbered, or resumed) and the file is complete
    Success { url: Url, dest: PathBuf },

    /// Local size already matches the remote; nothing was transferred
    AlreadyComplete { url: Url },

    /// The file could not be (fully) written
    Failure { url: Url, error: WriteError },
}

/// Writes one fetched resource to the local mirror
///
/// Behavior by local state (all under the containment guard below):
///
/// - no local file, or clobber set: stream the full response body into a
///   freshly created (truncated) file
/// - local file present: drop the original response after reading its
///   Content-Length, then
///   - equal sizes → [`DownloadOutcome::AlreadyComplete`]
///   - local smaller → wait the configured delay, re-GET with
///     `Range: bytes=<local>-<remote>`, require `206 Partial Content`,
///     append the tail
///   - local larger → fail; the remote changed and overwriting local data
///     is an explicit `--clobber` decision
///
/// The destination is normalized lexically and must stay inside the output
/// root even though the suffix was already decoded and joined upstream:
/// encoded segments like `%2e%2e%2f` only become `..` after decoding, and
/// this is the last line of defense. Every failure is per-file; the
/// response handle is consumed or dropped on all paths.
pub async fn write(
    client: &Client,
    config: &ScrapeConfig,
    pending: PendingDownload,
) -> DownloadOutcome {
    let PendingDownload { url, response, dest } = pending;

    let dest = normalize(&dest);
    if !dest.starts_with(&config.output_root) {
        let error = WriteError::PathEscape {
            dest,
            root: config.output_root.clone(),
        };
        return DownloadOutcome::Failure { url, error };
    }

    match write_inner(client, config, &url, response, &dest).await {
        Ok(WriteStatus::Complete) => DownloadOutcome::AlreadyComplete { url },
        Ok(_) => DownloadOutcome::Success { url, dest },
        Err(error) => DownloadOutcome::Failure { url, error },
    }
}

/// How the destination file reached its final state
enum WriteStatus {
    /// Full body streamed into a fresh file
    Written,
    /// Missing tail appended via a range request
    Resumed,
    /// Local size already matched the remote
    Complete,
}

async fn write_inner(
    client: &Client,
    config: &ScrapeConfig,
    url: &Url,
    response: Response,
    dest: &Path,
) -> Result<WriteStatus, WriteError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let local_len = match fs::metadata(dest).await {
        Ok(meta) if !config.clobber => meta.len(),
        _ => {
            let file = File::create(dest).await?;
            stream_body(file, response).await?;
            return Ok(WriteStatus::Written);
        }
    };

    // Resume path. Only the headers of the original response are wanted;
    // dropping it closes the connection without reading the body.
    let remote_len = response.content_length().ok_or(WriteError::MissingLength)?;
    drop(response);

    if local_len == remote_len {
        return Ok(WriteStatus::Complete);
    }
    if local_len > remote_len {
        return Err(WriteError::RangeNotSatisfiable {
            local: local_len,
            remote: remote_len,
        });
    }

    if !config.delay.is_zero() {
        tracing::debug!("Waiting {:?} before resuming {}", config.delay, url);
        tokio::time::sleep(config.delay).await;
    }

    tracing::debug!(
        "Resuming {} from byte {} of {}",
        url,
        local_len,
        remote_len
    );
    let ranged = fetch_range(client, url, local_len, remote_len).await?;
    if ranged.status() != StatusCode::PARTIAL_CONTENT {
        // A 200 here carries the whole body again; appending it would
        // corrupt the file, so anything but 206 is a failure.
        return Err(WriteError::RangeStatus {
            status: ranged.status().as_u16(),
        });
    }

    let file = OpenOptions::new().append(true).open(dest).await?;
    stream_body(file, ranged).await?;
    Ok(WriteStatus::Resumed)
}

/// Streams a response body into `file` chunk by chunk
async fn stream_body(mut file: File, response: Response) -> Result<(), WriteError> {
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}

/// Resolves `.` and `..` components lexically, without touching the filesystem
///
/// `std::fs::canonicalize` requires the path to exist; destinations do not
/// exist yet, so containment is checked against this lexical form. `..` at
/// the root stays at the root, like path normalization everywhere else.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    normalized
}
