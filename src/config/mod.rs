//! Configuration module for odscrape
//!
//! This module turns raw command-line inputs into a validated, immutable
//! [`ScrapeConfig`]: canonical base URL, canonicalized output root, compiled
//! exclude patterns, and the crawl's concurrency/resume knobs.
//!
//! # Example
//!
//! ```no_run
//! use odscrape::config::{ScrapeConfig, ScrapeOptions};
//!
//! let opts = ScrapeOptions {
//!     url: "http://example.com/files/".to_string(),
//!     output_dir: "./mirror".into(),
//!     parallel: 5,
//!     delay_secs: 0,
//!     exclude: vec!["*.iso".to_string()],
//!     exclude_from: None,
//!     clobber: false,
//! };
//! let config = ScrapeConfig::from_options(opts).unwrap();
//! println!("Mirroring into {}", config.output_root.display());
//! ```

mod excludes;
mod types;

// Re-export types
pub use excludes::ExcludeSet;
pub use types::{ScrapeConfig, ScrapeOptions};
