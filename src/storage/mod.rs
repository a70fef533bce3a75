//! Storage module for persisting crawl results
//!
//! Each target owns one directory holding:
//! - Append-only ledgers, one URL per line, one file per terminal classification
//! - Numbered corpus files `{index}_{hash}.txt`
//!
//! The success ledger doubles as the checkpoint: its line count is the next
//! corpus index and its last line positions a resumed crawl.

mod corpus;
mod ledger;
mod resume;

pub use corpus::{content_hash, corpus_file_name, discard_orphans, list_corpus_files, CorpusWriter};
pub use ledger::{read_ledger, Ledger, LedgerKind};
pub use resume::{restore_checkpoint, Checkpoint};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing a target directory
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Ledger I/O failed for {path}: {source}")]
    Ledger {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write corpus file {path}: {source}")]
    Corpus {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file listing {path}: {source}")]
    Listing {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL list I/O failed for {path}: {source}")]
    UrlList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Cannot resume: last recorded URL '{last_seen}' from {ledger} does not appear in the input list"
    )]
    ResumeCursorNotFound { last_seen: String, ledger: PathBuf },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
