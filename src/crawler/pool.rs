//! Site-level worker pool
//!
//! Runs one task per target with a bounded number in flight. Each task is
//! given its own time budget; a target that errors, panics or overruns is
//! logged and collected without disturbing the others.

use crate::crawler::coordinator::TargetReport;
use crate::CrawlError;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Why a target did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetFailure {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Failed(String),

    #[error("panicked: {0}")]
    Panicked(String),
}

/// Outcome of a pool run, in input order
#[derive(Debug, Default)]
pub struct PoolReport {
    pub completed: Vec<(String, TargetReport)>,
    pub failed: Vec<(String, TargetFailure)>,
}

impl PoolReport {
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    /// True if there was at least one target and none completed
    pub fn all_failed(&self) -> bool {
        self.completed.is_empty() && !self.failed.is_empty()
    }
}

/// Runs `job` once per target, at most `workers` at a time
///
/// The per-target `timeout` starts once the task holds a worker slot. The
/// pool returns after every task has finished, failed or been cancelled.
///
/// # Arguments
///
/// * `targets` - Target identifiers handed to `job`
/// * `workers` - Maximum concurrent targets (values below 1 are raised to 1)
/// * `timeout` - Time budget for a single target
/// * `job` - Crawls one target
pub async fn run_pool<F, Fut>(
    targets: Vec<String>,
    workers: usize,
    timeout: Duration,
    job: F,
) -> PoolReport
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TargetReport, CrawlError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let job = Arc::new(job);
    let mut tasks = JoinSet::new();

    tracing::info!(
        "Starting pool: {} targets, {} workers",
        targets.len(),
        workers.max(1)
    );

    for (position, target) in targets.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let job = Arc::clone(&job);

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (
                        position,
                        target,
                        Err(TargetFailure::Failed("worker pool closed".to_string())),
                    )
                }
            };

            let span = tracing::info_span!("target", name = %target);
            let mut handle = tokio::spawn(job(target.clone()).instrument(span));

            let outcome = match tokio::time::timeout(timeout, &mut handle).await {
                Ok(Ok(Ok(report))) => Ok(report),
                Ok(Ok(Err(e))) => Err(TargetFailure::Failed(e.to_string())),
                Ok(Err(join_error)) if join_error.is_panic() => Err(TargetFailure::Panicked(
                    panic_message(join_error.into_panic()),
                )),
                Ok(Err(join_error)) => Err(TargetFailure::Failed(join_error.to_string())),
                Err(_) => {
                    handle.abort();
                    Err(TargetFailure::TimedOut(timeout))
                }
            };

            (position, target, outcome)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!("Pool task lost: {}", e),
        }
    }
    results.sort_by_key(|(position, _, _)| *position);

    let mut report = PoolReport::default();
    for (_, target, outcome) in results {
        match outcome {
            Ok(target_report) => report.completed.push((target, target_report)),
            Err(failure) => {
                tracing::error!("Target {} failed: {}", target, failure);
                report.failed.push((target, failure));
            }
        }
    }

    tracing::info!(
        "Pool finished: {} completed, {} failed",
        report.completed.len(),
        report.failed.len()
    );
    report
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
