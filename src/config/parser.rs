use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Format of the `after` / `before` bounds in the feed configuration
const TIME_BOUND_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that output files can be traced back to the
/// configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Parses a `YYYY-MM-DD_HH-MM-SS` bound into a unix timestamp (UTC)
///
/// Single-digit fields are accepted (`2025-6-26_7-34-0`).
pub fn parse_time_bound(value: &str) -> Result<i64, ConfigError> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_BOUND_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| ConfigError::InvalidTime {
            value: value.to_string(),
        })
}
