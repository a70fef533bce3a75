//! URL lists and corpus listings written alongside a crawl

use crate::config::DedupParams;
use crate::storage::{StorageError, StorageResult};
use crate::CrawlError;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the corpus listing handed to the near-duplicate filter
pub const LISTING_FILE: &str = "filenames.txt";

/// Post-processing step run over a finished target's corpus
///
/// Receives the path of a listing holding one corpus file path per line.
pub trait NearDuplicateFilter: Send + Sync {
    fn filter(&self, listing: &Path, params: &DedupParams) -> Result<(), CrawlError>;
}

/// Writes URLs one per line, creating parent directories
pub fn write_url_list(path: &Path, urls: &[String]) -> StorageResult<()> {
    let url_err = |source: std::io::Error| StorageError::UrlList {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(url_err)?;
    }

    let mut content = String::with_capacity(urls.iter().map(|u| u.len() + 1).sum());
    for url in urls {
        content.push_str(url);
        content.push('\n');
    }
    fs::write(path, content).map_err(url_err)?;

    tracing::info!("URLs written to {}", path.display());
    Ok(())
}

/// Writes the corpus listing for a target directory
///
/// Returns the listing's path.
pub fn write_file_listing(folder: &Path, corpus_files: &[PathBuf]) -> StorageResult<PathBuf> {
    let path = folder.join(LISTING_FILE);
    let mut content = String::new();
    for file in corpus_files {
        content.push_str(&file.display().to_string());
        content.push('\n');
    }

    fs::write(&path, content).map_err(|source| StorageError::Listing {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
