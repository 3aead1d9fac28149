//! Feed-Harvester: a tolerant crawler for paginated post/comment/reply trees
//!
//! This crate walks a remote feed of posts, each post's top-level comments and
//! each comment's direct replies, normalizing loosely-shaped API payloads into
//! canonical records and appending every completed post to durable output.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod extract;
pub mod media;
pub mod output;
pub mod pagination;
pub mod sink;
pub mod transport;

use thiserror::Error;

/// Main error type for Feed-Harvester operations
///
/// Only failures that cannot be downgraded to partial results end up here:
/// configuration problems, catalog misses and sink IO failures.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid time bound '{value}': expected YYYY-MM-DD_HH-MM-SS")]
    InvalidTime { value: String },
}

/// Errors raised while loading or consulting the query catalog and the
/// reaction identifier table
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Query '{0}' is not present in the catalog")]
    Missing(String),

    #[error("Catalog entry '{name}' has an unsupported value")]
    InvalidEntry { name: String },
}

/// Errors from a single transport round-trip
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status}")]
    Status { status: u16 },

    #[error("Empty response body")]
    EmptyBody,

    #[error("Failed to encode request variables: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

/// Errors raised by the durable writer
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for Feed-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

// Re-export commonly used types
pub use catalog::{QueryCatalog, ReactionTable};
pub use config::Config;
pub use engine::{FeedReport, FeedRequest, HarvestSettings, Harvester};
pub use extract::{Comment, CommentThread, Post, ReactionSummary, Reply};
pub use media::MediaStore;
pub use pagination::{PageCursor, RetryPolicy, Termination};
pub use sink::{JsonlSink, Sink};
pub use transport::{HttpTransport, QueryRequest, RawResponse, Transport};
