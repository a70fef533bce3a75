//! Corpus-Crawl: a resumable sitemap-driven page harvester
//!
//! This crate discovers page URLs through sitemap traversal, fetches each page
//! with bounded retries, and persists the results into append-only ledgers and
//! numbered corpus files that survive interruption and resume cleanly.

pub mod config;
pub mod crawler;
pub mod output;
pub mod sitemap;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Corpus-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Near-duplicate filter failed for {listing}: {message}")]
    Dedup { listing: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Corpus-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FetchOutcome, TargetReport};
pub use storage::LedgerKind;
pub use url::{should_skip, SkipRules};
