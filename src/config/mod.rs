//! Configuration module for Sitemap-Tally
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file means [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use sitemap_tally::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tally.toml")).unwrap();
//! println!("Stream capacity: {}", config.crawler.stream_capacity);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, UserAgentConfig, DEFAULT_STREAM_CAPACITY};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
