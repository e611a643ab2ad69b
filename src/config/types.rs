use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::config::ExcludeSet;
use crate::url::canonicalize;
use crate::ConfigError;

/// Raw, unvalidated scrape inputs as they arrive from the command line
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Crawl root URL
    pub url: String,

    /// Local directory the remote tree is mirrored into
    pub output_dir: PathBuf,

    /// Maximum number of concurrent downloads
    pub parallel: usize,

    /// Seconds to wait before issuing a resumed range request
    pub delay_secs: u64,

    /// Exclude glob patterns given directly on the command line
    pub exclude: Vec<String>,

    /// Optional file of newline-separated exclude patterns
    pub exclude_from: Option<PathBuf>,

    /// Overwrite existing files instead of resuming them
    pub clobber: bool,
}

/// Validated, immutable scrape configuration
///
/// Built once at startup by [`ScrapeConfig::from_options`] and shared by
/// reference for the rest of the run. The base URL is canonical (it is the
/// scope boundary for the whole crawl) and the output root is absolute and
/// canonicalized, which the file writer's containment check relies on.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Canonical crawl root; scope boundary for every discovered link
    pub base_url: Url,

    /// Absolute, canonicalized local destination root
    pub output_root: PathBuf,

    /// Maximum number of concurrent downloads
    pub parallel: usize,

    /// Delay before a resumed range request
    pub delay: Duration,

    /// Compiled exclude patterns
    pub excludes: ExcludeSet,

    /// Overwrite existing files instead of resuming them
    pub clobber: bool,
}

impl ScrapeConfig {
    /// Validates raw options into a usable configuration
    ///
    /// This is the only place the process is allowed to fail hard: a bad
    /// URL, an unusable output directory, a glob that does not compile, or
    /// an unreadable exclude file all abort before any network traffic.
    /// The output directory is created here if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `options` - Raw command-line inputs
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeConfig)` - Validated configuration
    /// * `Err(ConfigError)` - The reason startup must abort
    pub fn from_options(options: ScrapeOptions) -> Result<Self, ConfigError> {
        let base_url = canonicalize(&options.url)?;

        if options.parallel < 1 {
            return Err(ConfigError::Validation(
                "parallel must be at least 1".to_string(),
            ));
        }

        // Create then canonicalize, so the containment check later compares
        // against a fully resolved absolute path.
        fs::create_dir_all(&options.output_dir).map_err(|e| ConfigError::OutputDir {
            path: options.output_dir.clone(),
            source: e,
        })?;
        let output_root = fs::canonicalize(&options.output_dir).map_err(|e| {
            ConfigError::OutputDir {
                path: options.output_dir.clone(),
                source: e,
            }
        })?;

        let mut patterns = options.exclude;
        if let Some(path) = &options.exclude_from {
            patterns.extend(ExcludeSet::load_file(path)?);
        }
        let excludes = ExcludeSet::compile(&patterns)?;

        Ok(Self {
            base_url,
            output_root,
            parallel: options.parallel,
            delay: Duration::from_secs(options.delay_secs),
            excludes,
            clobber: options.clobber,
        })
    }
}
