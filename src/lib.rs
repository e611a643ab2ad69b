//! Odscrape: an open directory scraper
//!
//! This crate mirrors the contents of a web server's browsable directory
//! listing to a local tree, bounding concurrent downloads and resuming
//! partially downloaded files across runs.

pub mod config;
pub mod crawler;
pub mod download;
pub mod url;

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for odscrape operations
///
/// Only two failures can end the process: a configuration that does not
/// validate, and an HTTP client that cannot be built. Everything past
/// startup is absorbed per-branch or per-file and never reaches this type.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid crawl root URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Cannot read exclude file {path}: {source}")]
    ExcludeFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {source}")]
    Parse {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Unsupported URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for odscrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

// Re-export commonly used types
pub use config::{ScrapeConfig, ScrapeOptions};
pub use crawler::{crawl, CrawlSummary};
pub use download::{DownloadOutcome, WriteError};
pub use url::{canonicalize, resolve};
