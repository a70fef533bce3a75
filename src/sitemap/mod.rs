//! Sitemap discovery
//!
//! This module resolves a site's sitemap into an ordered list of page URLs:
//! - Fetching sitemap documents with the shared HTTP client
//! - Following nested sitemap indexes within depth and count ceilings
//! - Ordering the collected URLs shallow-first

mod parser;

pub use parser::{parse_sitemap, ParsedSitemap, SitemapError};

use crate::config::SitemapConfig;
use crate::url::sort_by_depth;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};

/// Resolves sitemaps into page URLs
///
/// Resolution never fails: unreachable or malformed documents are logged and
/// contribute no URLs.
#[derive(Debug, Clone)]
pub struct SitemapResolver {
    client: Client,
    max_depth: u32,
    max_sitemaps: usize,
}

impl SitemapResolver {
    pub fn new(client: Client, config: &SitemapConfig) -> Self {
        Self {
            client,
            max_depth: config.max_depth,
            max_sitemaps: config.max_sitemaps,
        }
    }

    /// Returns the deduplicated page URLs reachable from a sitemap
    ///
    /// Nested `<sitemap>` entries are followed up to `max_depth` levels and
    /// at most `max_sitemaps` documents are fetched in total. A sitemap seen
    /// twice is only fetched once, which also breaks reference cycles.
    ///
    /// The result is sorted by ascending path depth, then lexicographically.
    pub async fn resolve(&self, sitemap_url: &str) -> Vec<String> {
        let mut queue = VecDeque::from([(sitemap_url.trim().to_string(), 0u32)]);
        let mut visited = HashSet::new();
        let mut pages = Vec::new();
        let mut fetched = 0usize;

        while let Some((url, depth)) = queue.pop_front() {
            if !visited.insert(url.clone()) {
                tracing::debug!("Sitemap {} already visited", url);
                continue;
            }

            if fetched >= self.max_sitemaps {
                tracing::warn!(
                    "Sitemap limit of {} reached; {} nested sitemaps left unread",
                    self.max_sitemaps,
                    queue.len() + 1
                );
                break;
            }
            fetched += 1;

            let parsed = match self.fetch_sitemap(&url).await {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Failed to read sitemap {}: {}", url, e);
                    continue;
                }
            };

            tracing::debug!(
                "Sitemap {}: {} pages, {} nested sitemaps",
                url,
                parsed.pages.len(),
                parsed.sitemaps.len()
            );

            pages.extend(parsed.pages);

            for nested in parsed.sitemaps {
                if depth + 1 > self.max_depth {
                    tracing::warn!(
                        "Not following {}: sitemap nesting exceeds {} levels",
                        nested,
                        self.max_depth
                    );
                    continue;
                }
                queue.push_back((nested.trim().to_string(), depth + 1));
            }
        }

        let urls = finalize(pages);
        if urls.is_empty() {
            tracing::warn!("No URLs found for {}", sitemap_url);
        } else {
            tracing::info!("Resolved {} URLs from {}", urls.len(), sitemap_url);
        }
        urls
    }

    async fn fetch_sitemap(&self, url: &str) -> Result<ParsedSitemap, SitemapError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        parse_sitemap(&body)
    }
}

/// Trims, deduplicates and orders collected URLs
fn finalize(pages: Vec<String>) -> Vec<String> {
    let mut urls: Vec<String> = pages
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    sort_by_depth(&mut urls);
    urls.dedup();
    urls
}
