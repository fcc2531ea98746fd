//! Robots.txt handling module
//!
//! Sitemaps are usually advertised in a site's robots.txt. This module fetches
//! that file and lists the sitemap entry points it declares. Allow/Disallow
//! rules and crawl delays are not consulted.

mod parser;

pub use parser::parse_sitemap_directives;

use crate::crawler::fetch_document;
use crate::TallyError;
use reqwest::Client;
use url::Url;

/// Fetches robots.txt and returns the sitemaps it lists
///
/// Unlike sitemap fetches during a crawl, a failure here is returned to the
/// caller: without entry points there is nothing to crawl.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `robots_url` - Absolute URL of the robots.txt file
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Sitemap locations in file order (possibly empty)
/// * `Err(TallyError)` - The file could not be fetched
pub async fn fetch_sitemap_entries(
    client: &Client,
    robots_url: &str,
) -> Result<Vec<String>, TallyError> {
    tracing::debug!("Fetching robots.txt from {}", robots_url);
    let body = fetch_document(client, robots_url).await?;
    let sitemaps = parse_sitemap_directives(&String::from_utf8_lossy(&body));
    tracing::info!("{} lists {} sitemap(s)", robots_url, sitemaps.len());
    Ok(sitemaps)
}

/// Checks whether a URL points at a robots.txt file
///
/// # Examples
///
/// ```
/// use sitemap_tally::robots::is_robots_url;
/// use url::Url;
///
/// assert!(is_robots_url(&Url::parse("https://a.com/robots.txt").unwrap()));
/// assert!(!is_robots_url(&Url::parse("https://a.com/sitemap.xml").unwrap()));
/// ```
pub fn is_robots_url(url: &Url) -> bool {
    url.path().ends_with("robots.txt")
}
