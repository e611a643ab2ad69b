//! Odscrape main entry point
//!
//! This is the command-line interface for the odscrape directory mirrorer.

use clap::Parser;
use odscrape::config::{ScrapeConfig, ScrapeOptions};
use odscrape::crawler::crawl;
use odscrape::ScrapeError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Odscrape: an open directory scraper
///
/// Odscrape walks a web server's browsable directory listing and mirrors
/// every file underneath it into a local tree. Re-running against the same
/// output directory skips complete files and resumes partial ones with
/// byte-range requests, so an interrupted mirror just picks up where it
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "odscrape")]
#[command(version)]
#[command(about = "Mirror an open directory to a local tree", long_about = None)]
struct Cli {
    /// Root URL of the directory listing to mirror
    #[arg(short, long)]
    url: String,

    /// Local directory that receives the mirrored tree
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Maximum number of concurrent downloads
    #[arg(short, long, default_value_t = 5)]
    parallel: usize,

    /// Overwrite existing files instead of resuming them
    #[arg(short, long)]
    clobber: bool,

    /// Seconds to wait before issuing a resume range request
    #[arg(short, long, default_value_t = 0)]
    delay: u64,

    /// Skip anything whose path under the root matches this glob (repeatable)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// File of newline-separated globs, merged with --exclude
    #[arg(short = 'f', long)]
    exclude_from: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    let options = ScrapeOptions {
        url: cli.url,
        output_dir: cli.output_dir,
        parallel: cli.parallel,
        delay_secs: cli.delay,
        exclude: cli.exclude,
        exclude_from: cli.exclude_from,
        clobber: cli.clobber,
    };

    // Validate configuration. Startup is the only stage where an error
    // ends the process, and every exit goes through ScrapeError.
    let config = match ScrapeConfig::from_options(options) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(ScrapeError::Config(e).into());
        }
    };

    tracing::info!(
        "Mirroring {} into {}",
        config.base_url,
        config.output_root.display()
    );
    tracing::info!(
        "Parallel downloads: {}, clobber: {}, exclude patterns: {}",
        config.parallel,
        config.clobber,
        config.excludes.len()
    );

    let summary = crawl(config).await?;

    if summary.failed > 0 {
        tracing::warn!("{} downloads failed; re-run to retry them", summary.failed);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("odscrape=info,warn"),
        1 => EnvFilter::new("odscrape=debug,info"),
        2 => EnvFilter::new("odscrape=trace,debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
