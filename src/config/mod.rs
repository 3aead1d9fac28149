//! Configuration module for Feed-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use feed_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collecting at most {} posts", config.crawler.max_posts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, CrawlerConfig, FeedConfig, OutputConfig, Ranking, TransportConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_time_bound};

/// Lower bound sent when no `after` bound is configured
pub const OPEN_AFTER: i64 = 0;

/// Upper bound sent when no `before` bound is configured
pub const OPEN_BEFORE: i64 = 9_999_999_999_999;

/// Time window passed to the server with every feed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub after: i64,
    pub before: i64,
}

impl FeedConfig {
    /// Resolves the configured bounds into unix timestamps
    pub fn time_window(&self) -> crate::ConfigResult<TimeWindow> {
        let after = match &self.after {
            Some(value) => parse_time_bound(value)?,
            None => OPEN_AFTER,
        };
        let before = match &self.before {
            Some(value) => parse_time_bound(value)?,
            None => OPEN_BEFORE,
        };
        Ok(TimeWindow { after, before })
    }

    /// Short name of the feed owner, derived from the last URL path segment
    pub fn page_name(&self) -> String {
        self.page_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("unknown")
            .to_string()
    }
}
