//! Sitemap-Tally: a concurrent sitemap crawler
//!
//! This crate walks a sitemap document tree, following index documents down to
//! their URL sets, and reduces every discovered URL to a single count (either a
//! total or a case-insensitive substring match count).

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod tally;

use thiserror::Error;

/// Main error type for Sitemap-Tally operations
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Invalid starting reference: {0}")]
    InvalidStart(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Sitemap-Tally operations
pub type Result<T> = std::result::Result<T, TallyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ClassifiedDocument, CrawlOptions, Crawler, ResultStream};
pub use tally::{reduce, ReduceMode};
