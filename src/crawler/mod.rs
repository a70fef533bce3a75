//! Crawler module for page fetching and persistence
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retries and failure classification
//! - Text extraction from fetched pages
//! - The per-target crawl loop with checkpoint/resume
//! - The per-site pipeline and the worker pool running it

mod cleaner;
mod coordinator;
mod fetcher;
mod pool;
mod retry;
mod site;

pub use cleaner::{HtmlCleaner, PageCleaner};
pub use coordinator::{Coordinator, CrawlPhase, TargetReport};
pub use fetcher::{build_http_client, fetch_url, FetchOutcome};
pub use pool::{run_pool, PoolReport, TargetFailure};
pub use retry::{run_with_retry, AttemptError, RetryPolicy};
pub use site::{distinct_targets, select_top_level, SiteCrawler};
