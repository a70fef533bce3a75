//! URL handling module for Corpus-Crawl
//!
//! This module provides domain splitting, sitemap ordering helpers and the
//! skip classifier that filters URLs before any network call.

mod depth;
mod domain;
mod matcher;

use crate::config::SkipConfig;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

// Re-export main functions
pub use depth::{is_top_level, path_depth, sort_by_depth};
pub use domain::{extract_domain, split_host, target_name, DomainParts};
pub use matcher::{matches_domain, matches_extension};

static DEFAULT_EXTENSIONS: LazyLock<Vec<String>> =
    LazyLock::new(|| parse_list(include_str!("../../data/exclude_extensions.txt")));

static DEFAULT_DOMAINS: LazyLock<Vec<String>> =
    LazyLock::new(|| parse_list(include_str!("../../data/exclude_domains.txt")));

fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Extension and domain exclusion sets
///
/// Built once per invocation and shared read-only between all targets.
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    extensions: Vec<String>,
    domains: HashSet<String>,
}

impl SkipRules {
    /// Creates rules from explicit lists
    pub fn new<E, D>(extensions: E, domains: D) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut rules = Self::default();
        rules.extend(extensions, domains);
        rules
    }

    /// Creates rules holding the built-in exclusion lists
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter(), DEFAULT_DOMAINS.iter())
    }

    /// Creates rules from configuration, adding the built-in lists if enabled
    pub fn from_config(config: &SkipConfig) -> Self {
        let mut rules = if config.default_skip {
            Self::with_defaults()
        } else {
            Self::default()
        };
        rules.extend(&config.extensions, &config.domains);
        rules
    }

    /// Adds extensions and domains to the exclusion sets
    pub fn extend<E, D>(&mut self, extensions: E, domains: D)
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        for ext in extensions {
            let ext = ext.as_ref().trim().to_lowercase();
            if !ext.is_empty() && !self.extensions.contains(&ext) {
                self.extensions.push(ext);
            }
        }
        for domain in domains {
            let domain = domain.as_ref().trim().to_lowercase();
            if !domain.is_empty() {
                self.domains.insert(domain);
            }
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn domains(&self) -> &HashSet<String> {
        &self.domains
    }
}

/// Decides whether a URL should never be fetched
///
/// A URL is skipped if its path ends with an excluded extension, or if its
/// bare registrable name, apex domain or full host is an excluded domain.
/// Unparseable URLs are tested for extensions on the raw string only.
///
/// # Examples
///
/// ```
/// use corpus_crawl::url::{should_skip, SkipRules};
///
/// let rules = SkipRules::new([".pdf"], ["example.org"]);
/// assert!(should_skip("https://news.example.com/page.pdf", &rules));
/// assert!(should_skip("https://www.example.org/", &rules));
/// assert!(!should_skip("https://example.com/page.html", &rules));
/// ```
pub fn should_skip(url: &str, rules: &SkipRules) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return matches_extension(url, &rules.extensions),
    };

    if matches_extension(parsed.path(), &rules.extensions) {
        return true;
    }

    match extract_domain(&parsed) {
        Some(host) => matches_domain(&split_host(&host), &rules.domains),
        None => false,
    }
}
