use crate::config::parser::parse_time_bound;
use crate::config::types::{CatalogConfig, Config, CrawlerConfig, FeedConfig, OutputConfig, TransportConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_feed_config(&config.feed)?;
    validate_transport_config(&config.transport)?;
    validate_catalog_config(&config.catalog)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler limits and retry policy
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_posts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_posts must be >= 1, got {}",
            config.max_posts
        )));
    }

    if config.max_root_comments < 1 {
        return Err(ConfigError::Validation(format!(
            "max_root_comments must be >= 1, got {} (use include-comments = false to skip comments)",
            config.max_root_comments
        )));
    }

    if config.max_replies < 1 {
        return Err(ConfigError::Validation(format!(
            "max_replies must be >= 1, got {}",
            config.max_replies
        )));
    }

    if config.max_retry < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retry must be >= 1, got {}",
            config.max_retry
        )));
    }

    if config.feed_page_size < 1 || config.feed_page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "feed_page_size must be between 1 and 100, got {}",
            config.feed_page_size
        )));
    }

    Ok(())
}

/// Validates the feed identity and time window
fn validate_feed_config(config: &FeedConfig) -> Result<(), ConfigError> {
    Url::parse(&config.page_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid page_url: {}", e)))?;

    if config.page_id.trim().is_empty() {
        return Err(ConfigError::Validation("page_id cannot be empty".to_string()));
    }

    let after = config.after.as_deref().map(parse_time_bound).transpose()?;
    let before = config.before.as_deref().map(parse_time_bound).transpose()?;

    if let (Some(after), Some(before)) = (after, before) {
        if after > before {
            return Err(ConfigError::Validation(format!(
                "after bound ({}) is later than before bound ({})",
                after, before
            )));
        }
    }

    Ok(())
}

/// Validates the endpoint and session headers
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "endpoint must use http or https, got '{}'",
            endpoint.scheme()
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    for name in config.headers.keys() {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::Validation(format!(
                "Invalid header name '{}'",
                name
            )));
        }
    }

    Ok(())
}

fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if config.queries_path.is_empty() {
        return Err(ConfigError::Validation(
            "queries_path cannot be empty".to_string(),
        ));
    }

    if config.reactions_path.is_empty() {
        return Err(ConfigError::Validation(
            "reactions_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.download_media && config.media_directory.is_empty() {
        return Err(ConfigError::Validation(
            "media_directory cannot be empty when download_media is enabled".to_string(),
        ));
    }

    Ok(())
}
