//! Per-site pipeline
//!
//! Takes a target root URL through sitemap discovery, top-level selection,
//! the crawl itself and the corpus listing for post-processing.

use crate::config::Config;
use crate::crawler::cleaner::{HtmlCleaner, PageCleaner};
use crate::crawler::coordinator::{Coordinator, TargetReport};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::pool::{run_pool, PoolReport};
use crate::crawler::retry::RetryPolicy;
use crate::output::{write_file_listing, write_url_list, NearDuplicateFilter};
use crate::sitemap::SitemapResolver;
use crate::url::{is_top_level, target_name, SkipRules};
use crate::CrawlError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Crawls whole sites from their root URL
pub struct SiteCrawler {
    config: Arc<Config>,
    resolver: SitemapResolver,
    coordinator: Coordinator,
    dedup: Option<Arc<dyn NearDuplicateFilter>>,
}

impl SiteCrawler {
    /// Builds a crawler with the default HTML cleaner
    ///
    /// One HTTP client is shared by sitemap discovery and page fetching.
    pub fn from_config(config: Config) -> Result<Self, CrawlError> {
        Self::with_cleaner(config, Arc::new(HtmlCleaner))
    }

    pub fn with_cleaner(config: Config, cleaner: Arc<dyn PageCleaner>) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.fetch)?;
        let rules = Arc::new(SkipRules::from_config(&config.skip));
        tracing::debug!(
            "Skip rules: {} extensions, {} domains",
            rules.extensions().len(),
            rules.domains().len()
        );

        let resolver = SitemapResolver::new(client.clone(), &config.sitemap);
        let coordinator = Coordinator::new(
            client,
            RetryPolicy::from_config(&config.fetch),
            rules,
            cleaner,
        );

        Ok(Self {
            config: Arc::new(config),
            resolver,
            coordinator,
            dedup: None,
        })
    }

    /// Runs `filter` over each finished target's corpus listing
    pub fn with_dedup(mut self, filter: Arc<dyn NearDuplicateFilter>) -> Self {
        self.dedup = Some(filter);
        self
    }

    fn output_root(&self) -> PathBuf {
        PathBuf::from(&self.config.output.root)
    }

    /// Output directory for a target
    pub fn target_dir(&self, name: &str) -> PathBuf {
        self.output_root().join("scraped").join(name)
    }

    /// Crawls every target through the worker pool
    ///
    /// Blank entries are dropped before scheduling, and so is every root that
    /// maps to the same target directory as an earlier one.
    pub async fn run(self: Arc<Self>, targets: Vec<String>) -> PoolReport {
        let targets = distinct_targets(targets);

        let workers = self.config.pool.workers;
        let timeout = Duration::from_secs(self.config.pool.target_timeout);

        run_pool(targets, workers, timeout, move |root| {
            let crawler = Arc::clone(&self);
            async move { crawler.process_website(&root).await }
        })
        .await
    }

    /// Discovers, selects and crawls the pages of one site
    ///
    /// # Arguments
    ///
    /// * `root` - The site's root URL, e.g. `https://example.com`
    ///
    /// # Returns
    ///
    /// * `Ok(TargetReport)` - The crawl finished; an empty report if the
    ///   sitemap yielded nothing
    /// * `Err(CrawlError)` - The root URL is unusable or the target
    ///   directory could not be written
    pub async fn process_website(&self, root: &str) -> Result<TargetReport, CrawlError> {
        let root = root.trim().trim_end_matches('/');
        let invalid = |reason: String| CrawlError::InvalidTarget {
            target: root.to_string(),
            reason,
        };

        let root_url = Url::parse(root).map_err(|e| invalid(e.to_string()))?;
        let name = target_name(&root_url).ok_or_else(|| invalid("URL has no host".to_string()))?;

        let sitemap_url = format!(
            "{}/{}",
            root,
            self.config.sitemap.path.trim_start_matches('/')
        );
        let folder = self.target_dir(&name);

        tracing::info!("Processing {} as {}", root, name);
        let urls = self.resolver.resolve(&sitemap_url).await;
        if urls.is_empty() {
            tracing::info!("No URLs found for {}", root);
            return Ok(TargetReport::empty(&folder));
        }

        let output_root = self.output_root();
        let list_name = format!("{}_urls.txt", name);
        write_url_list(&output_root.join("websites").join(&list_name), &urls)?;

        let selected = select_top_level(urls, self.config.sitemap.top_level_limit);
        tracing::info!("{} top-level URLs selected for {}", selected.len(), name);

        let to_scrape = output_root.join("to_scrape").join(&list_name);
        write_url_list(&to_scrape, &selected)?;

        let report = self.coordinator.crawl_file(&to_scrape, &folder).await?;
        self.finish_target(&folder, &report).await?;
        Ok(report)
    }

    /// Crawls an arbitrary URL list into `folder`
    pub async fn download_pages(&self, link_file: &Path, folder: &Path) -> Result<TargetReport, CrawlError> {
        let report = self.coordinator.crawl_file(link_file, folder).await?;
        self.finish_target(folder, &report).await?;
        Ok(report)
    }

    /// Writes the corpus listing and runs the near-duplicate filter on it
    ///
    /// The filter runs on the blocking pool. Its failure or panic is logged
    /// and does not fail the target.
    async fn finish_target(&self, folder: &Path, report: &TargetReport) -> Result<(), CrawlError> {
        let listing = write_file_listing(folder, &report.corpus_files)?;

        if let Some(filter) = &self.dedup {
            tracing::info!("Running near-duplicate filter over {}", listing.display());
            let filter = Arc::clone(filter);
            let params = self.config.dedup.clone();
            let result =
                tokio::task::spawn_blocking(move || filter.filter(&listing, &params)).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("Near-duplicate filter failed: {}", e),
                Err(e) => tracing::error!("Near-duplicate filter aborted: {}", e),
            }
        }
        Ok(())
    }
}

/// Trims targets and keeps the first root for each target directory
///
/// `https://example.com`, `https://example.com/` and `https://www.example.com`
/// all write to `scraped/example.com/`, so only the first is kept. Roots
/// without a target name are kept and fail in the pipeline.
pub fn distinct_targets(targets: Vec<String>) -> Vec<String> {
    let mut names = HashSet::new();
    let mut distinct = Vec::new();

    for target in targets {
        let target = target.trim();
        if target.is_empty() {
            continue;
        }

        let name = Url::parse(target.trim_end_matches('/'))
            .ok()
            .and_then(|url| target_name(&url));
        if let Some(name) = name {
            if !names.insert(name.clone()) {
                tracing::warn!("Dropping {}: target {} is already scheduled", target, name);
                continue;
            }
        }
        distinct.push(target.to_string());
    }
    distinct
}

/// Keeps the first `limit` top-level URLs, preserving order
pub fn select_top_level(urls: Vec<String>, limit: usize) -> Vec<String> {
    urls.into_iter()
        .filter(|url| is_top_level(url))
        .take(limit)
        .collect()
}
