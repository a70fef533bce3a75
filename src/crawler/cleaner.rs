//! Page text extraction
//!
//! Turns a raw response body into the plain text stored in the corpus.

use scraper::{Html, Node};

/// Elements whose text never reaches the corpus
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line of text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Converts a raw page body into cleaned text
///
/// Implementations must be deterministic. An empty result is a valid outcome
/// and routes the page to the empty-content ledger.
pub trait PageCleaner: Send + Sync {
    fn clean(&self, raw: &[u8]) -> String;
}

/// Extracts visible text from HTML
///
/// Invalid UTF-8 is replaced rather than rejected. Each block element starts
/// a new line, whitespace inside a line is collapsed and blank lines dropped.
///
/// # Example
///
/// ```
/// use corpus_crawl::crawler::{HtmlCleaner, PageCleaner};
///
/// let html = b"<html><body><h1>Title</h1><p>Some   text</p><script>x()</script></body></html>";
/// assert_eq!(HtmlCleaner.clean(html), "Title\nSome text");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlCleaner;

impl PageCleaner for HtmlCleaner {
    fn clean(&self, raw: &[u8]) -> String {
        let html = String::from_utf8_lossy(raw);
        let document = Html::parse_document(&html);

        let mut text = String::new();
        for node in document.root_element().descendants() {
            match node.value() {
                Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => {
                    text.push('\n');
                }
                Node::Text(fragment) => {
                    let hidden = node.ancestors().any(|ancestor| {
                        ancestor
                            .value()
                            .as_element()
                            .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
                    });
                    if !hidden {
                        text.push_str(fragment);
                    }
                }
                _ => {}
            }
        }

        text.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
