use serde::Deserialize;

/// Browser user agent sent with every page and sitemap request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Corpus-Crawl
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub skip: SkipConfig,
    pub sitemap: SitemapConfig,
    pub pool: PoolConfig,
    pub output: OutputConfig,
    pub dedup: DedupParams,
}

/// Per-page fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Seconds to wait for a page before abandoning the attempt
    pub timeout: u64,

    /// Total attempts for connection and timeout failures
    pub retries: u32,

    /// Base of the exponential backoff between attempts (seconds)
    #[serde(rename = "backoff-base")]
    pub backoff_base: f64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            retries: 3,
            backoff_base: 0.3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Exclusion lists applied before any network call
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkipConfig {
    /// Include the built-in extension and domain exclusion lists
    #[serde(rename = "default-skip")]
    pub default_skip: bool,

    /// Extra path extensions to exclude (e.g. ".pdf")
    pub extensions: Vec<String>,

    /// Extra domains to exclude: bare name, apex domain or full subdomain
    pub domains: Vec<String>,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            default_skip: true,
            extensions: Vec::new(),
            domains: Vec::new(),
        }
    }
}

/// Sitemap discovery limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Sitemap location relative to a target's root URL
    pub path: String,

    /// Maximum nesting depth of sitemap indexes
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of sitemap documents fetched per target
    #[serde(rename = "max-sitemaps")]
    pub max_sitemaps: usize,

    /// Number of top-level URLs kept per target
    #[serde(rename = "top-level-limit")]
    pub top_level_limit: usize,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            path: "sitemap.xml".to_string(),
            max_depth: 5,
            max_sitemaps: 500,
            top_level_limit: 100,
        }
    }
}

/// Site-level concurrency
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of targets crawled at once
    pub workers: usize,

    /// Wall-clock budget for one target (seconds)
    #[serde(rename = "target-timeout")]
    pub target_timeout: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            target_timeout: 600,
        }
    }
}

/// Output layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding `websites/`, `to_scrape/` and `scraped/`
    pub root: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
        }
    }
}

/// Parameters handed to the near-duplicate filter after a target finishes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DedupParams {
    /// Similarity above which two documents are duplicates
    pub threshold: f64,

    /// Shingle granularity ("word" or "char")
    pub granularity: String,

    /// Tokens per shingle
    #[serde(rename = "shingle-size")]
    pub shingle_size: usize,

    /// Bloom filter capacity
    pub capacity: u64,

    /// Target false-positive rate of the filter
    #[serde(rename = "error-rate")]
    pub error_rate: f64,

    /// Number of header lines to ignore in each document
    pub header: usize,

    /// Progress reporting interval in documents
    pub interval: u64,
}

impl Default for DedupParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            granularity: "word".to_string(),
            shingle_size: 8,
            capacity: 100_000_000,
            error_rate: 1e-7,
            header: 0,
            interval: 1_000_000,
        }
    }
}
