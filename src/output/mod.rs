//! Output module for crawl artifacts and summaries
//!
//! This module handles:
//! - URL lists written during site discovery
//! - The corpus listing handed to the near-duplicate filter
//! - Run statistics printed at the end of a crawl

mod listing;
pub mod stats;

pub use listing::{write_file_listing, write_url_list, NearDuplicateFilter, LISTING_FILE};
pub use stats::{collect_statistics, print_statistics, target_statistics, CrawlStatistics};
