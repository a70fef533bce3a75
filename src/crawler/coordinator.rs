//! Crawler coordinator - per-target crawl loop
//!
//! This module drives one target from its URL list to the on-disk corpus:
//! - Restoring the checkpoint of an interrupted run
//! - Filtering excluded URLs before any request
//! - Fetching, cleaning and persisting each page in order
//! - Recording every terminal classification in its ledger

use crate::crawler::cleaner::PageCleaner;
use crate::crawler::fetcher::{fetch_url, FetchOutcome};
use crate::crawler::retry::RetryPolicy;
use crate::storage::{
    list_corpus_files, restore_checkpoint, CorpusWriter, Ledger, LedgerKind, StorageError,
};
use crate::url::{should_skip, SkipRules};
use crate::CrawlError;
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Phases a target moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Resolving,
    Fetching,
    Classifying,
    Persisting,
    Done,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Classifying => "classifying",
            Self::Persisting => "persisting",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

/// What one target's crawl produced
#[derive(Debug, Clone, Default)]
pub struct TargetReport {
    /// The target's output directory
    pub folder: PathBuf,

    /// True if an earlier run's checkpoint was picked up
    pub resumed: bool,

    /// Index of the first page written in this run
    pub start_index: u64,

    /// Index the next run will start from
    pub next_index: u64,

    /// URLs recorded in each ledger during this run
    pub counts: HashMap<LedgerKind, u64>,

    /// Every corpus file in the target directory, ordered by index
    pub corpus_files: Vec<PathBuf>,
}

impl TargetReport {
    /// A report for a target that had nothing to crawl
    pub fn empty(folder: &Path) -> Self {
        Self {
            folder: folder.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn count(&self, kind: LedgerKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Pages written to the corpus during this run
    pub fn pages_written(&self) -> u64 {
        self.next_index - self.start_index
    }
}

/// Crawls URL lists into target directories
///
/// URLs within a target are processed strictly one after another; the
/// success ledger's line count is the next corpus index.
#[derive(Clone)]
pub struct Coordinator {
    client: Client,
    policy: RetryPolicy,
    rules: Arc<SkipRules>,
    cleaner: Arc<dyn PageCleaner>,
}

impl Coordinator {
    pub fn new(
        client: Client,
        policy: RetryPolicy,
        rules: Arc<SkipRules>,
        cleaner: Arc<dyn PageCleaner>,
    ) -> Self {
        Self {
            client,
            policy,
            rules,
            cleaner,
        }
    }

    /// Crawls a file holding one URL per line into `folder`
    pub async fn crawl_file(&self, link_file: &Path, folder: &Path) -> Result<TargetReport, CrawlError> {
        let content = std::fs::read_to_string(link_file).map_err(|source| StorageError::UrlList {
            path: link_file.to_path_buf(),
            source,
        })?;
        let links = content.lines().map(str::to_string).collect();
        self.crawl_urls(links, folder).await
    }

    /// Crawls URLs in order into `folder`, resuming a previous run if present
    ///
    /// # Errors
    ///
    /// Only storage failures are returned: the directory cannot be created,
    /// a ledger or corpus file cannot be written, or the resume cursor is
    /// missing from `links`. Individual page failures are recorded, not
    /// returned.
    pub async fn crawl_urls(&self, links: Vec<String>, folder: &Path) -> Result<TargetReport, CrawlError> {
        let mut links = links.into_iter().map(|link| link.trim().to_string());

        tracing::trace!(phase = %CrawlPhase::Resolving, "Restoring checkpoint for {}", folder.display());
        let checkpoint = restore_checkpoint(folder, &mut links)?;
        let mut seen = checkpoint.seen;

        let mut ledger = Ledger::open(folder)?;
        let corpus = CorpusWriter::new(folder);

        let mut report = TargetReport {
            folder: folder.to_path_buf(),
            resumed: checkpoint.resumed,
            start_index: checkpoint.next_index,
            next_index: checkpoint.next_index,
            ..TargetReport::default()
        };

        for link in links {
            if link.is_empty() {
                continue;
            }
            if !seen.insert(link.clone()) {
                tracing::debug!("Already classified {}", link);
                continue;
            }

            if should_skip(&link, &self.rules) {
                tracing::info!("Skip {}", link);
                self.record(&mut ledger, &mut report, LedgerKind::Skipped, &link)?;
                continue;
            }

            tracing::trace!(phase = %CrawlPhase::Fetching, "{}", link);
            let outcome = fetch_url(&self.client, &link, &self.policy).await;

            tracing::trace!(phase = %CrawlPhase::Classifying, "{}", link);
            let page = match outcome {
                FetchOutcome::Success(page) => page,
                failure => {
                    let kind = failure
                        .failure_ledger()
                        .unwrap_or(LedgerKind::Malformed);
                    tracing::info!("Failed ({}) {}", kind, link);
                    self.record(&mut ledger, &mut report, kind, &link)?;
                    continue;
                }
            };

            let text = self.cleaner.clean(&page);
            if text.is_empty() {
                tracing::info!("Empty page {}", link);
                self.record(&mut ledger, &mut report, LedgerKind::Empty, &link)?;
                continue;
            }

            tracing::trace!(phase = %CrawlPhase::Persisting, "{}", link);
            corpus.write_entry(report.next_index, &link, &text)?;
            self.record(&mut ledger, &mut report, LedgerKind::Success, &link)?;
            tracing::info!("{} {}", report.next_index, link);
            report.next_index += 1;
        }

        report.corpus_files = list_corpus_files(folder)?;
        tracing::trace!(phase = %CrawlPhase::Done, "{}", folder.display());
        tracing::info!(
            "Finished {}: {} pages written, {} skipped, {} failed, {} empty",
            folder.display(),
            report.pages_written(),
            report.count(LedgerKind::Skipped),
            report.count(LedgerKind::Malformed)
                + report.count(LedgerKind::NonAscii)
                + report.count(LedgerKind::Connection),
            report.count(LedgerKind::Empty)
        );

        Ok(report)
    }

    fn record(
        &self,
        ledger: &mut Ledger,
        report: &mut TargetReport,
        kind: LedgerKind,
        link: &str,
    ) -> Result<(), StorageError> {
        ledger.record(kind, link)?;
        *report.counts.entry(kind).or_insert(0) += 1;
        Ok(())
    }
}
