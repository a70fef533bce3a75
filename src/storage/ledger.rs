use crate::storage::{StorageError, StorageResult};
use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Terminal classification of a URL within one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKind {
    /// Fetched, cleaned and written to the corpus
    Success,

    /// Excluded by extension or domain before fetching
    Skipped,

    /// Connection or timeout failures that exhausted their retries
    Connection,

    /// Malformed URLs and protocol errors
    Malformed,

    /// Text encoding failures
    NonAscii,

    /// Fetched but no text survived cleaning
    Empty,
}

impl LedgerKind {
    pub const ALL: [LedgerKind; 6] = [
        Self::Success,
        Self::Skipped,
        Self::Connection,
        Self::Malformed,
        Self::NonAscii,
        Self::Empty,
    ];

    /// File name of this ledger inside a target directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Success => "index.urls",
            Self::Skipped => "skip.urls",
            Self::Connection => "connection.urls",
            Self::Malformed => "bad.urls",
            Self::NonAscii => "non_ascii.urls",
            Self::Empty => "empty.urls",
        }
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Connection => "connection-failure",
            Self::Malformed => "malformed",
            Self::NonAscii => "non-ascii",
            Self::Empty => "empty-content",
        };
        f.write_str(label)
    }
}

/// The open ledgers of one target directory
///
/// Every `record` writes a full line and flushes it before returning, so a
/// crawl interrupted between two records leaves only complete lines behind.
#[derive(Debug)]
pub struct Ledger {
    dir: PathBuf,
    files: HashMap<LedgerKind, File>,
}

impl Ledger {
    /// Opens (creating if needed) all ledgers in append mode
    pub fn open(dir: &Path) -> StorageResult<Self> {
        let mut files = HashMap::new();
        for kind in LedgerKind::ALL {
            let path = kind.path_in(dir);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| StorageError::Ledger { path, source })?;
            files.insert(kind, file);
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    /// Appends one URL to the given ledger
    pub fn record(&mut self, kind: LedgerKind, url: &str) -> StorageResult<()> {
        let path = kind.path_in(&self.dir);
        let file = self
            .files
            .get_mut(&kind)
            .ok_or_else(|| StorageError::Ledger {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "ledger not open"),
            })?;

        file.write_all(format!("{}\n", url).as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| StorageError::Ledger { path, source })
    }
}

/// Reads a ledger's URLs, trimmed, skipping blank lines
///
/// A missing ledger reads as empty.
pub fn read_ledger(path: &Path) -> StorageResult<Vec<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StorageError::Ledger {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut urls = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| StorageError::Ledger {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if !line.is_empty() {
            urls.push(line.to_string());
        }
    }
    Ok(urls)
}
