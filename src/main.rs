//! Sitemap-Tally main entry point
//!
//! This is the command-line interface for the Sitemap-Tally crawler.

use anyhow::{bail, Context};
use clap::Parser;
use sitemap_tally::config::{load_config_with_hash, validate, Config};
use sitemap_tally::crawler::Crawler;
use sitemap_tally::output::{print_summary, RunSummary};
use sitemap_tally::robots::{fetch_sitemap_entries, is_robots_url};
use sitemap_tally::tally::{reduce, ReduceMode};
use sitemap_tally::TallyError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sitemap-Tally: count the URLs behind a sitemap
///
/// Crawls a sitemap and every sitemap it references, then reports how many
/// page URLs were found, or how many of them contain a pattern. Pass a
/// robots.txt URL to start from the sitemaps it advertises.
#[derive(Parser, Debug)]
#[command(name = "sitemap-tally")]
#[command(version)]
#[command(about = "Count the URLs behind a sitemap", long_about = None)]
struct Cli {
    /// Sitemap URL, or a robots.txt URL listing sitemaps
    #[arg(value_name = "URL")]
    url: String,

    /// Count only URLs containing this text (case-insensitive)
    #[arg(short, long)]
    pattern: Option<String>,

    /// With a robots.txt URL: tally only the Nth listed sitemap (1-based)
    #[arg(short, long, value_name = "N", conflicts_with = "list")]
    select: Option<usize>,

    /// With a robots.txt URL: print the listed sitemaps and exit
    #[arg(long)]
    list: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum fetches in flight (overrides the config file)
    #[arg(long, value_name = "N")]
    max_concurrent_fetches: Option<usize>,

    /// Result buffer capacity (overrides the config file)
    #[arg(long, value_name = "N")]
    stream_capacity: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;
    let start = Url::parse(&cli.url)
        .map_err(|e| TallyError::InvalidStart(format!("'{}': {}", cli.url, e)))?;
    if !matches!(start.scheme(), "http" | "https") {
        return Err(TallyError::InvalidStart(format!(
            "'{}' must use http or https",
            cli.url
        ))
        .into());
    }

    let crawler = Crawler::from_config(&config).context("Failed to set up crawler")?;

    let selections = if is_robots_url(&start) {
        let sitemaps = discover_sitemaps(&crawler, start.as_str()).await?;
        if cli.list {
            for (i, sitemap) in sitemaps.iter().enumerate() {
                println!("{:>3}. {}", i + 1, sitemap);
            }
            return Ok(());
        }
        select_sitemaps(sitemaps, cli.select)?
    } else {
        if cli.list || cli.select.is_some() {
            bail!("--list and --select require a robots.txt URL");
        }
        vec![cli.url.clone()]
    };

    let mode = ReduceMode::from_pattern(cli.pattern.clone());
    for selection in selections {
        let stream = crawler.crawl(selection.as_str());
        let stats = stream.stats();
        let count = reduce(stream, &mode).await;

        let summary = RunSummary::new(selection, mode.clone(), count, stats.snapshot());
        print_summary(&summary, cli.verbose > 0);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_tally=info,warn"),
            1 => EnvFilter::new("sitemap_tally=debug,info"),
            2 => EnvFilter::new("sitemap_tally=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file if given, then applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(limit) = cli.max_concurrent_fetches {
        config.crawler.max_concurrent_fetches = Some(limit);
    }
    if let Some(capacity) = cli.stream_capacity {
        config.crawler.stream_capacity = capacity;
    }
    validate(&config).context("Invalid crawler settings")?;

    Ok(config)
}

/// Fetches robots.txt; an empty sitemap list is an error
async fn discover_sitemaps(crawler: &Crawler, robots_url: &str) -> anyhow::Result<Vec<String>> {
    let sitemaps = fetch_sitemap_entries(crawler.client(), robots_url)
        .await
        .with_context(|| format!("Error fetching robots.txt from {}", robots_url))?;

    if sitemaps.is_empty() {
        bail!("{} does not list any sitemaps", robots_url);
    }
    Ok(sitemaps)
}

/// Applies `--select`, or keeps every sitemap when it is absent
fn select_sitemaps(sitemaps: Vec<String>, select: Option<usize>) -> anyhow::Result<Vec<String>> {
    match select {
        None => Ok(sitemaps),
        Some(n) if (1..=sitemaps.len()).contains(&n) => Ok(vec![sitemaps[n - 1].clone()]),
        Some(n) => bail!(
            "--select {} is out of range: robots.txt lists {} sitemap(s)",
            n,
            sitemaps.len()
        ),
    }
}
