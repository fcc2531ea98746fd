//! Aggregation of the crawl's result stream
//!
//! The stream delivers URLs in no particular order, so both reductions are
//! plain counts: the result does not depend on how branches interleave.

mod matcher;

pub use matcher::PatternMatcher;

use crate::crawler::ResultStream;
use std::fmt;

/// How discovered URLs are reduced to a single number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceMode {
    /// Count every URL
    Total,
    /// Count URLs containing the pattern, ignoring case
    PatternMatch(String),
}

impl ReduceMode {
    /// Builds the mode from an optional pattern: `None` means [`ReduceMode::Total`]
    pub fn from_pattern(pattern: Option<String>) -> Self {
        match pattern {
            Some(pattern) => Self::PatternMatch(pattern),
            None => Self::Total,
        }
    }

    /// The pattern, for [`ReduceMode::PatternMatch`]
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::Total => None,
            Self::PatternMatch(pattern) => Some(pattern),
        }
    }
}

impl fmt::Display for ReduceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::PatternMatch(pattern) => write!(f, "pattern \"{}\"", pattern),
        }
    }
}

/// Drains the stream to completion and reduces it to one count
///
/// Returns only after the crawl has finished and the stream has closed.
///
/// # Example
///
/// ```no_run
/// use sitemap_tally::config::Config;
/// use sitemap_tally::crawler::Crawler;
/// use sitemap_tally::tally::{reduce, ReduceMode};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let crawler = Crawler::from_config(&Config::default())?;
/// let stream = crawler.crawl("https://example.com/sitemap.xml");
/// let products = reduce(stream, &ReduceMode::PatternMatch("product".into())).await;
/// println!("{} product pages", products);
/// # Ok(())
/// # }
/// ```
pub async fn reduce(mut stream: ResultStream, mode: &ReduceMode) -> u64 {
    let mut count = 0u64;

    match mode {
        ReduceMode::Total => {
            while stream.next().await.is_some() {
                count += 1;
            }
        }
        ReduceMode::PatternMatch(pattern) => {
            let matcher = PatternMatcher::new(pattern);
            while let Some(url) = stream.next().await {
                if matcher.matches(&url) {
                    count += 1;
                }
            }
        }
    }

    tracing::debug!("Reduced stream ({}) to {}", mode, count);
    count
}
