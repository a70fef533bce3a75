//! Sitemap XML parsing
//!
//! Handles both `<urlset>` documents and `<sitemapindex>` documents. Namespace
//! prefixes are ignored; only local element names are inspected.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Malformed sitemap XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed sitemap text: {0}")]
    Text(String),

    #[error("Failed to fetch sitemap: {0}")]
    Http(#[from] reqwest::Error),
}

/// Locations extracted from one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSitemap {
    /// `<sitemap><loc>` entries pointing at nested sitemaps
    pub sitemaps: Vec<String>,

    /// `<url><loc>` entries pointing at pages
    pub pages: Vec<String>,
}

impl ParsedSitemap {
    pub fn is_empty(&self) -> bool {
        self.sitemaps.is_empty() && self.pages.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Entry {
    Sitemap,
    Url,
}

/// Parses a sitemap or sitemap index
///
/// # Example
///
/// ```
/// use corpus_crawl::sitemap::parse_sitemap;
///
/// let xml = br#"<urlset><url><loc> https://example.com/a </loc></url></urlset>"#;
/// let parsed = parse_sitemap(xml).unwrap();
/// assert_eq!(parsed.pages, vec!["https://example.com/a".to_string()]);
/// ```
pub fn parse_sitemap(content: &[u8]) -> Result<ParsedSitemap, SitemapError> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut parsed = ParsedSitemap::default();
    let mut buf = Vec::new();
    let mut entry: Option<Entry> = None;
    let mut loc: Option<String> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                saw_root = true;
                match e.local_name().as_ref() {
                    b"sitemap" => entry = Some(Entry::Sitemap),
                    b"url" => entry = Some(Entry::Url),
                    b"loc" if entry.is_some() => loc = Some(String::new()),
                    _ => {}
                }
            }
            Event::Empty(_) => saw_root = true,
            Event::Text(t) => {
                if let Some(text) = loc.as_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| SitemapError::Text(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(c) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"loc" => {
                    if let (Some(text), Some(kind)) = (loc.take(), entry) {
                        let text = text.trim();
                        if !text.is_empty() {
                            match kind {
                                Entry::Sitemap => parsed.sitemaps.push(text.to_string()),
                                Entry::Url => parsed.pages.push(text.to_string()),
                            }
                        }
                    }
                }
                b"sitemap" | b"url" => entry = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(SitemapError::Text("document has no root element".to_string()));
    }

    Ok(parsed)
}
