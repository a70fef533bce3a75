use std::net::IpAddr;
use url::Url;

/// A host split at its public suffix
///
/// `news.example.co.uk` splits into subdomain `news`, name `example` and
/// suffix `co.uk`. IP hosts carry the address as the name and no suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParts {
    pub subdomain: String,
    pub name: String,
    pub suffix: String,
}

impl DomainParts {
    /// The registrable domain (`example.co.uk`), or the bare name without a suffix
    pub fn registrable(&self) -> String {
        if self.suffix.is_empty() {
            self.name.clone()
        } else if self.name.is_empty() {
            self.suffix.clone()
        } else {
            format!("{}.{}", self.name, self.suffix)
        }
    }
}

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use corpus_crawl::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Splits a host into subdomain, registrable name and public suffix
///
/// Suffixes come from the Public Suffix List, so multi-label suffixes such
/// as `co.uk` are kept whole.
pub fn split_host(host: &str) -> DomainParts {
    let host = host.trim_end_matches('.').to_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');

    if bare.parse::<IpAddr>().is_ok() {
        return DomainParts {
            subdomain: String::new(),
            name: bare.to_string(),
            suffix: String::new(),
        };
    }

    let suffix = psl::suffix_str(&host).unwrap_or("").to_string();
    let registrable = psl::domain_str(&host).unwrap_or("");

    let name = registrable
        .strip_suffix(suffix.as_str())
        .map(|s| s.trim_end_matches('.'))
        .unwrap_or("")
        .to_string();

    let subdomain = if registrable.is_empty() {
        String::new()
    } else {
        host.strip_suffix(registrable)
            .map(|s| s.trim_end_matches('.'))
            .unwrap_or("")
            .to_string()
    };

    DomainParts {
        subdomain,
        name,
        suffix,
    }
}

/// Derives the on-disk target name for a root URL
///
/// The registrable domain is used so `www.example.com` and `example.com` share
/// a directory; an explicit port is appended to keep local targets apart.
pub fn target_name(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    let parts = split_host(&host);
    let mut name = parts.registrable();
    if name.is_empty() {
        name = host;
    }
    if let Some(port) = url.port() {
        name = format!("{}_{}", name, port);
    }
    Some(name)
}
