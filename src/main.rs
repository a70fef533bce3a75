//! Corpus-Crawl main entry point
//!
//! This is the command-line interface for the Corpus-Crawl page harvester.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use corpus_crawl::config::{load_config_with_hash, Config};
use corpus_crawl::crawler::SiteCrawler;
use corpus_crawl::output::{collect_statistics, print_statistics, target_statistics};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Corpus-Crawl: a resumable sitemap-driven page harvester
///
/// Corpus-Crawl discovers each target site's pages through its sitemap,
/// fetches the top-level pages and stores their text as a numbered corpus.
/// Interrupted runs pick up where they stopped.
#[derive(Parser, Debug)]
#[command(name = "corpus-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A resumable sitemap-driven page harvester", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["targets", "list"])))]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// File with one target root URL per line
    #[arg(long, value_name = "FILE")]
    targets: Option<PathBuf>,

    /// File with one page URL per line, crawled into --folder
    #[arg(long, value_name = "URL_FILE", requires = "folder")]
    list: Option<PathBuf>,

    /// Output directory for --list mode
    #[arg(long, value_name = "DIR", requires = "list")]
    folder: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also write logs to a timestamped file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_dir.as_deref())?;

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((config, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    config
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    match (&cli.targets, &cli.list, &cli.folder) {
        (Some(targets), _, _) => {
            let targets = read_lines(targets)?;
            if cli.dry_run {
                handle_dry_run(&config, &targets);
                Ok(())
            } else {
                handle_targets(config, targets).await
            }
        }
        (None, Some(list), Some(folder)) => {
            if cli.dry_run {
                let links = read_lines(list)?;
                handle_dry_run(&config, &[]);
                println!("\nWould crawl {} URLs into {}", links.len(), folder.display());
                Ok(())
            } else {
                handle_list(config, list, folder).await
            }
        }
        _ => anyhow::bail!("either --targets or --list with --folder is required"),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_crawl=info,warn"),
            1 => EnvFilter::new("corpus_crawl=debug,info"),
            2 => EnvFilter::new("corpus_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_name = chrono::Local::now()
                .format("script_%Y%m%d_%H%M%S.log")
                .to_string();
            let appender = RollingFileAppender::new(Rotation::NEVER, dir, file_name);
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Handles the --dry-run mode: shows the resolved configuration and targets
fn handle_dry_run(config: &Config, targets: &[String]) {
    println!("=== Corpus-Crawl Dry Run ===\n");

    println!("Fetch:");
    println!("  Timeout: {}s", config.fetch.timeout);
    println!("  Attempts: {}", config.fetch.retries);
    println!("  Backoff base: {}s", config.fetch.backoff_base);
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nSkip:");
    println!("  Built-in lists: {}", config.skip.default_skip);
    println!("  Extra extensions: {}", config.skip.extensions.len());
    println!("  Extra domains: {}", config.skip.domains.len());

    println!("\nSitemap:");
    println!("  Path: {}", config.sitemap.path);
    println!("  Max depth: {}", config.sitemap.max_depth);
    println!("  Max sitemaps: {}", config.sitemap.max_sitemaps);
    println!("  Top-level limit: {}", config.sitemap.top_level_limit);

    println!("\nPool:");
    println!("  Workers: {}", config.pool.workers);
    println!("  Target timeout: {}s", config.pool.target_timeout);

    println!("\nOutput root: {}", config.output.root);

    if !targets.is_empty() {
        println!("\nTargets ({}):", targets.len());
        for target in targets {
            println!(
                "  - {}/{}",
                target.trim_end_matches('/'),
                config.sitemap.path.trim_start_matches('/')
            );
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles pool mode: every target runs through the site pipeline
async fn handle_targets(config: Config, targets: Vec<String>) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} targets with {} workers into {}",
        targets.len(),
        config.pool.workers,
        config.output.root
    );

    let crawler = Arc::new(SiteCrawler::from_config(config)?);
    let report = crawler.run(targets).await;

    print_statistics(&collect_statistics(&report));

    if report.all_failed() {
        anyhow::bail!("all {} targets failed", report.failed.len());
    }
    Ok(())
}

/// Handles list mode: one URL file crawled into one folder
async fn handle_list(config: Config, list: &Path, folder: &Path) -> anyhow::Result<()> {
    tracing::info!("Crawling {} into {}", list.display(), folder.display());

    let crawler = SiteCrawler::from_config(config)?;
    match crawler.download_pages(list, folder).await {
        Ok(report) => {
            print_statistics(&target_statistics(&report));
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
