//! Checkpoint restoration for interrupted crawls

use crate::storage::corpus::discard_orphans;
use crate::storage::ledger::{read_ledger, LedgerKind};
use crate::storage::{StorageError, StorageResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Where a target's crawl picks up
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    /// Index assigned to the next successful page
    pub next_index: u64,

    /// True if an existing success ledger was found
    pub resumed: bool,

    /// Every URL already recorded in any ledger of the target
    pub seen: HashSet<String>,
}

/// Restores the checkpoint of a target directory and positions the input
///
/// If the directory already holds a success ledger, the next index is its
/// line count and `links` is advanced past the ledger's last URL. Otherwise
/// the directory is created, the index starts at 0 and `links` is left
/// untouched.
///
/// # Errors
///
/// Returns `StorageError::ResumeCursorNotFound` if `links` runs out before
/// the last recorded URL is found, which happens when the input list was
/// edited between runs.
pub fn restore_checkpoint<I>(dir: &Path, links: &mut I) -> StorageResult<Checkpoint>
where
    I: Iterator<Item = String>,
{
    let index_path = LedgerKind::Success.path_in(dir);

    if !(dir.is_dir() && index_path.exists()) {
        fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        tracing::debug!("Starting fresh crawl in {}", dir.display());
        discard_orphans(dir, 0)?;
        return Ok(Checkpoint {
            next_index: 0,
            resumed: false,
            seen: load_seen(dir)?,
        });
    }

    let recorded = read_ledger(&index_path)?;
    let next_index = recorded.len() as u64;
    discard_orphans(dir, next_index)?;

    if let Some(last_seen) = recorded.last() {
        let mut skipped = 0usize;
        loop {
            match links.next() {
                Some(link) if link.trim() == last_seen.as_str() => break,
                Some(_) => skipped += 1,
                None => {
                    return Err(StorageError::ResumeCursorNotFound {
                        last_seen: last_seen.clone(),
                        ledger: index_path,
                    })
                }
            }
        }
        tracing::info!(
            "Resuming {} at index {} after {} ({} earlier lines passed)",
            dir.display(),
            next_index,
            last_seen,
            skipped
        );
    }

    Ok(Checkpoint {
        next_index,
        resumed: true,
        seen: load_seen(dir)?,
    })
}

fn load_seen(dir: &Path) -> StorageResult<HashSet<String>> {
    let mut seen = HashSet::new();
    for kind in LedgerKind::ALL {
        seen.extend(read_ledger(&kind.path_in(dir))?);
    }
    Ok(seen)
}
