//! HTTP access for the crawl
//!
//! This module owns every request the scraper makes:
//! - Building the shared HTTP client with a proper user agent
//! - Plain GETs with `Accept-Encoding: identity`
//! - Byte-range GETs used to resume partial files
//! - Content-Type inspection to tell listings from files

use reqwest::header::{ACCEPT_ENCODING, CONTENT_TYPE, RANGE};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by the traversal and every download task
///
/// Redirects follow reqwest's default policy, so listings served behind a
/// trailing-slash redirect still resolve.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    // Format: name/version
    let user_agent = format!("odscrape/{}", env!("CARGO_PKG_VERSION"));

    // Only the connect phase is bounded. A whole-request timeout would
    // abort large downloads mid-stream.
    // TODO: bound stalled transfers with read_timeout after moving to reqwest 0.12.
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// GETs `url`, refusing compressed transfer encodings
///
/// `Accept-Encoding: identity` keeps Content-Length equal to the byte
/// count that lands on disk. A compressed response would report the
/// compressed length, and every later resume comparison against the
/// local file size would be wrong.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch(client: &Client, url: &Url) -> Result<Response, reqwest::Error> {
    client
        .get(url.clone())
        .header(ACCEPT_ENCODING, "identity")
        .send()
        .await
}

/// Re-GETs `url` asking only for bytes `local` through `remote`
///
/// The caller must check for `206 Partial Content` before appending the
/// body: a server is free to ignore the Range header and answer 200 with
/// the full resource.
pub async fn fetch_range(
    client: &Client,
    url: &Url,
    local: u64,
    remote: u64,
) -> Result<Response, reqwest::Error> {
    client
        .get(url.clone())
        .header(ACCEPT_ENCODING, "identity")
        .header(RANGE, format!("bytes={}-{}", local, remote))
        .send()
        .await
}

/// Whether the response declares an HTML body
///
/// Directory listings come back as `text/html`, usually with a charset
/// parameter attached. Anything else, including a missing Content-Type,
/// is treated as a file to download.
pub fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("text/html"))
        .unwrap_or(false)
}
