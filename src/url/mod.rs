//! URL handling module for odscrape
//!
//! This module provides URL canonicalization, href resolution, crawl-scope
//! containment checks, and suffix extraction/decoding.

mod canonical;
mod scope;

// Re-export main functions
pub use canonical::{canonicalize, resolve};
pub use scope::{decoded_suffix, in_scope};
