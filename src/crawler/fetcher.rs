//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building HTTP clients with the configured user agent
//! - GET requests returning the raw document body
//! - Mapping transport, status and body failures onto [`TallyError`]

use crate::config::Config;
use crate::TallyError;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The full configuration (user agent and optional timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sitemap_tally::config::Config;
/// use sitemap_tally::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.header_value())
        .gzip(true)
        .brotli(true);

    if let Some(secs) = config.crawler.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Fetches a document and returns its full body
///
/// No validation happens before the request: a malformed location fails here,
/// at fetch time. The caller is expected to treat every error variant the same
/// way; the variants only exist for diagnostics.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The response body of a 2xx response
/// * `Err(TallyError::Http)` - The request could not be sent or completed
/// * `Err(TallyError::Status)` - The server answered with a non-success status
/// * `Err(TallyError::Body)` - The body could not be read
pub async fn fetch_document(client: &Client, url: &str) -> Result<Vec<u8>, TallyError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| TallyError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TallyError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|source| TallyError::Body {
        url: url.to_string(),
        source,
    })?;

    Ok(body.into())
}
