use crate::storage::{StorageError, StorageResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Hex digest naming a corpus file
///
/// Derived from the source URL and cleaned text, so the name is stable for
/// identical content.
pub fn content_hash(url: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// `{index}_{hash}.txt`
pub fn corpus_file_name(index: u64, url: &str, text: &str) -> String {
    format!("{}_{}.txt", index, content_hash(url, text))
}

/// Writes corpus entries into a target directory
#[derive(Debug, Clone)]
pub struct CorpusWriter {
    dir: PathBuf,
}

impl CorpusWriter {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Writes one entry: the source URL on the first line, then the text
    pub fn write_entry(&self, index: u64, url: &str, text: &str) -> StorageResult<PathBuf> {
        let path = self.dir.join(corpus_file_name(index, url, text));
        fs::write(&path, format!("{}\n{}", url, text))
            .map_err(|source| StorageError::Corpus {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Parses the index out of a corpus file name
fn corpus_index(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(".txt")?;
    let (index, hash) = stem.split_once('_')?;
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    index.parse().ok()
}

/// Lists the corpus files in a target directory, ordered by index
pub fn list_corpus_files(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    let read_err = |source: std::io::Error| StorageError::Corpus {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name();
        if let Some(index) = name.to_str().and_then(corpus_index) {
            entries.push((index, entry.path()));
        }
    }
    entries.sort();
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

/// Removes corpus files at or past `next_index`
///
/// A page written to the corpus but not yet recorded in the success ledger
/// leaves such a file behind; its index is handed out again on resume.
/// Returns the number of files removed.
pub fn discard_orphans(dir: &Path, next_index: u64) -> StorageResult<usize> {
    let mut removed = 0;
    for path in list_corpus_files(dir)? {
        let index = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(corpus_index);
        if index.is_some_and(|index| index >= next_index) {
            fs::remove_file(&path).map_err(|source| StorageError::Corpus {
                path: path.clone(),
                source,
            })?;
            tracing::warn!("Removed unrecorded corpus file {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
