use url::Url;

/// Number of `/`-separated segments in a URL string
///
/// The scheme separator counts, so `https://example.com/x` has depth 4.
pub fn path_depth(url: &str) -> usize {
    url.split('/').count()
}

/// Sorts URLs shallow-first, then lexicographically within a depth
///
/// # Examples
///
/// ```
/// use corpus_crawl::url::sort_by_depth;
///
/// let mut urls = vec![
///     "https://example.com/a/b/c".to_string(),
///     "https://example.com/x".to_string(),
/// ];
/// sort_by_depth(&mut urls);
/// assert_eq!(urls[0], "https://example.com/x");
/// ```
pub fn sort_by_depth(urls: &mut [String]) {
    urls.sort_by(|a, b| path_depth(a).cmp(&path_depth(b)).then_with(|| a.cmp(b)));
}

/// Returns true if the URL path has at most one segment
///
/// The site root counts as top-level, as does `/about/`.
pub fn is_top_level(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().trim_matches('/').split('/').count() == 1,
        Err(_) => false,
    }
}
