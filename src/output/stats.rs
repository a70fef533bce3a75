//! Statistics over a finished crawl
//!
//! This module aggregates per-target reports into run totals and prints
//! them for the operator.

use crate::crawler::{PoolReport, TargetFailure, TargetReport};
use crate::storage::LedgerKind;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Targets that ran to completion
    pub targets_completed: u64,

    /// Targets that timed out, errored or panicked
    pub failures: Vec<(String, TargetFailure)>,

    /// Targets picked up from an earlier run's checkpoint
    pub targets_resumed: u64,

    /// URLs recorded this run, by ledger
    pub urls_by_ledger: HashMap<LedgerKind, u64>,

    /// Corpus files present across all completed targets
    pub corpus_files: u64,
}

impl CrawlStatistics {
    /// Total URLs classified during this run
    pub fn total_urls(&self) -> u64 {
        self.urls_by_ledger.values().sum()
    }

    pub fn count(&self, kind: LedgerKind) -> u64 {
        self.urls_by_ledger.get(&kind).copied().unwrap_or(0)
    }

    fn add_target(&mut self, report: &TargetReport) {
        self.targets_completed += 1;
        if report.resumed {
            self.targets_resumed += 1;
        }
        for (kind, count) in &report.counts {
            *self.urls_by_ledger.entry(*kind).or_insert(0) += count;
        }
        self.corpus_files += report.corpus_files.len() as u64;
    }
}

/// Aggregates a pool run
pub fn collect_statistics(report: &PoolReport) -> CrawlStatistics {
    let mut stats = CrawlStatistics::default();
    for (_, target) in &report.completed {
        stats.add_target(target);
    }
    stats.failures = report.failed.clone();
    stats
}

/// Statistics for a single crawled list
pub fn target_statistics(report: &TargetReport) -> CrawlStatistics {
    let mut stats = CrawlStatistics::default();
    stats.add_target(report);
    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Targets completed: {}", stats.targets_completed);
    println!("  Targets resumed: {}", stats.targets_resumed);
    println!("  Targets failed: {}", stats.failures.len());
    println!("  Corpus files: {}", stats.corpus_files);
    println!();

    let total = stats.total_urls();
    println!("URLs by Ledger:");
    for kind in LedgerKind::ALL {
        let count = stats.count(kind);
        if count == 0 {
            continue;
        }
        let percentage = (count as f64 / total as f64) * 100.0;
        println!("  {} ({}): {} ({:.1}%)", kind, kind.file_name(), count, percentage);
    }
    if total == 0 {
        println!("  (none)");
    }

    if !stats.failures.is_empty() {
        println!();
        println!("Failed Targets:");
        for (target, failure) in &stats.failures {
            println!("  {}: {}", target, failure);
        }
    }
}
