use crate::config::types::{Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;

const MAX_STREAM_CAPACITY: usize = 100_000;
const MAX_CONCURRENT_FETCHES: usize = 1024;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.stream_capacity < 1 || config.stream_capacity > MAX_STREAM_CAPACITY {
        return Err(ConfigError::Validation(format!(
            "stream_capacity must be between 1 and {}, got {}",
            MAX_STREAM_CAPACITY, config.stream_capacity
        )));
    }

    if let Some(limit) = config.max_concurrent_fetches {
        if limit < 1 || limit > MAX_CONCURRENT_FETCHES {
            return Err(ConfigError::Validation(format!(
                "max_concurrent_fetches must be between 1 and {}, got {}",
                MAX_CONCURRENT_FETCHES, limit
            )));
        }
    }

    if config.request_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}
