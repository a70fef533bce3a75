//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the shared HTTP client with a browser user agent
//! - GET requests returning the raw response body
//! - Classifying failures into terminal and retryable buckets

use crate::config::FetchConfig;
use crate::crawler::retry::{run_with_retry, AttemptError, RetryPolicy};
use crate::storage::LedgerKind;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Result of fetching one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Raw response body, uninterpreted
    Success(Vec<u8>),

    /// Malformed URL, bad scheme or HTTP protocol error
    Malformed(String),

    /// Text decoding failure
    Encoding(String),

    /// Connection or timeout failure after every attempt was used
    Connection(String),
}

impl FetchOutcome {
    /// The ledger a failed outcome is recorded in; `None` for success
    pub fn failure_ledger(&self) -> Option<LedgerKind> {
        match self {
            Self::Success(_) => None,
            Self::Malformed(_) => Some(LedgerKind::Malformed),
            Self::Encoding(_) => Some(LedgerKind::NonAscii),
            Self::Connection(_) => Some(LedgerKind::Connection),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Builds the HTTP client shared by the sitemap resolver and fetcher
///
/// Certificate and hostname validation are disabled so that long-tail sites
/// with broken TLS setups can still be harvested.
///
/// # Example
///
/// ```no_run
/// use corpus_crawl::config::FetchConfig;
/// use corpus_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    tracing::debug!("Building HTTP client with TLS certificate validation disabled");

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout))
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with the retry policy applied
///
/// # Error Classification
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | Unparseable URL, non-HTTP scheme | `Malformed`, no retry |
/// | HTTP status outside 2xx, redirect failure | `Malformed`, no retry |
/// | Host fails IDNA encoding, body decode failure | `Encoding`, no retry |
/// | Connect error, timeout, TLS handshake, dropped body | retried, then `Connection` |
/// | Anything else | `Malformed`, no retry |
pub async fn fetch_url(client: &Client, url: &str, policy: &RetryPolicy) -> FetchOutcome {
    let target = match parse_target(url) {
        Ok(target) => target,
        Err(AttemptError::Encoding(reason)) => {
            tracing::warn!("Encoding error {} for {}", reason, url);
            return FetchOutcome::Encoding(reason);
        }
        Err(
            AttemptError::Malformed(reason)
            | AttemptError::Retryable(reason)
            | AttemptError::Unexpected(reason),
        ) => {
            tracing::warn!("Error {} for {}", reason, url);
            return FetchOutcome::Malformed(reason);
        }
    };

    run_with_retry(policy, url, |_| fetch_once(client, target.clone())).await
}

fn parse_target(url: &str) -> Result<Url, AttemptError> {
    let parsed = Url::parse(url).map_err(|e| match e {
        url::ParseError::IdnaError => AttemptError::Encoding(e.to_string()),
        other => AttemptError::Malformed(other.to_string()),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(AttemptError::Malformed(format!(
            "unsupported scheme '{}'",
            scheme
        ))),
    }
}

async fn fetch_once(client: &Client, url: Url) -> Result<Vec<u8>, AttemptError> {
    let response = client.get(url).send().await.map_err(classify_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(AttemptError::Malformed(format!("HTTP {}", status)));
    }

    let body = response.bytes().await.map_err(classify_error)?;
    Ok(body.to_vec())
}

/// Maps a reqwest error onto the retry buckets
fn classify_error(error: reqwest::Error) -> AttemptError {
    let message = error.to_string();

    if error.is_timeout() || error.is_connect() {
        AttemptError::Retryable(message)
    } else if error.is_builder() || error.is_redirect() || error.is_status() {
        AttemptError::Malformed(message)
    } else if error.is_decode() {
        AttemptError::Encoding(message)
    } else if error.is_body() || error.is_request() {
        AttemptError::Retryable(message)
    } else {
        AttemptError::Unexpected(message)
    }
}
