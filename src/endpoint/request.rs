//! HTTP request construction
//!
//! This module handles the outgoing side of an endpoint execution:
//! - Building the shared HTTP client with timeouts and compression
//! - Turning a rendered method/URL/body and header map into a request
//! - Applying the default browser User-Agent when none is configured

use crate::config::ClientConfig;
use crate::ScrapeError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Request};
use std::collections::HashMap;
use std::time::Duration;

/// User-Agent sent when the endpoint does not configure one
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Builds an HTTP client with the configured timeouts
///
/// # Example
///
/// ```no_run
/// use endpoint_scraper::config::ClientConfig;
/// use endpoint_scraper::endpoint::build_http_client;
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds a request from rendered parts
///
/// Header names are matched case-insensitively; if none of them is
/// `User-Agent`, [`DEFAULT_USER_AGENT`] is added.
pub fn build_request(
    client: &Client,
    method: &str,
    url: &str,
    body: Option<String>,
    headers: &HashMap<String, String>,
) -> Result<Request, ScrapeError> {
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| ScrapeError::InvalidRequest(format!("invalid method '{}'", method)))?;

    let mut builder = client.request(method, url).headers(header_map(headers)?);
    if let Some(body) = body {
        builder = builder.body(body);
    }

    builder
        .build()
        .map_err(|e| ScrapeError::InvalidRequest(format!("{}: {}", url, e)))
}

/// Converts configured headers into a header map
///
/// Header names are case-insensitive. When several configured keys name the
/// same header (`Accept` and `accept`), keys are applied in byte order and
/// the last one wins, so `accept` overrides `Accept`.
pub fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, ScrapeError> {
    let mut map = HeaderMap::with_capacity(headers.len() + 1);

    let mut entries: Vec<_> = headers.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    for (name, value) in entries {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ScrapeError::InvalidRequest(format!("invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ScrapeError::InvalidRequest(format!("invalid value for header '{}'", name.as_str()))
        })?;
        map.insert(name, value);
    }

    if !map.contains_key(USER_AGENT) {
        map.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }

    Ok(map)
}
