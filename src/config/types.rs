use serde::Deserialize;

/// Default capacity of the result stream buffer
pub const DEFAULT_STREAM_CAPACITY: usize = 100;

/// Main configuration structure for Sitemap-Tally
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once (unset = unbounded)
    #[serde(rename = "max-concurrent-fetches", default)]
    pub max_concurrent_fetches: Option<usize>,

    /// Capacity of the buffer between crawl tasks and the aggregator
    #[serde(rename = "stream-capacity", default = "default_stream_capacity")]
    pub stream_capacity: usize,

    /// Per-request timeout in seconds (unset = wait forever)
    #[serde(rename = "request-timeout-secs", default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: None,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
            request_timeout_secs: None,
        }
    }
}

fn default_stream_capacity() -> usize {
    DEFAULT_STREAM_CAPACITY
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}
