use crate::url::domain::DomainParts;
use std::collections::HashSet;

/// Checks if a URL path ends with any excluded extension
///
/// Both sides are compared in lowercase; `extensions` is expected to be
/// lowercase already.
pub fn matches_extension(path: &str, extensions: &[String]) -> bool {
    let path = path.to_lowercase();
    extensions.iter().any(|ext| path.ends_with(ext.as_str()))
}

/// Checks a host against the excluded-domain set at three granularities
///
/// An entry matches if it equals the bare registrable name (`google`), the
/// apex domain (`google.com`) or the full host (`news.google.com`).
///
/// A bare name matches every suffix carrying that label, so `example` also
/// excludes `example.org`.
///
/// # Examples
///
/// ```
/// use corpus_crawl::url::{matches_domain, split_host};
/// use std::collections::HashSet;
///
/// let parts = split_host("news.google.com");
/// let excluded: HashSet<String> = ["google".to_string()].into_iter().collect();
/// assert!(matches_domain(&parts, &excluded));
/// ```
pub fn matches_domain(parts: &DomainParts, domains: &HashSet<String>) -> bool {
    if domains.is_empty() {
        return false;
    }

    if !parts.name.is_empty() && domains.contains(&parts.name) {
        return true;
    }

    let apex = parts.registrable();
    if !apex.is_empty() && domains.contains(&apex) {
        return true;
    }

    if !parts.subdomain.is_empty() {
        let full = format!("{}.{}", parts.subdomain, apex);
        if domains.contains(&full) {
            return true;
        }
    }

    false
}
