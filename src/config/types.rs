use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Feed-Harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub feed: FeedConfig,
    pub transport: TransportConfig,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
}

/// Crawl limits, retry policy and pacing
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of posts collected from the feed
    #[serde(rename = "max-posts")]
    pub max_posts: usize,

    /// Maximum number of root comments collected per post
    #[serde(rename = "max-root-comments")]
    pub max_root_comments: usize,

    /// Maximum number of replies collected per root comment
    #[serde(rename = "max-replies")]
    pub max_replies: usize,

    /// Consecutive failed fetches tolerated before a stream is abandoned
    #[serde(rename = "max-retry")]
    pub max_retry: u32,

    /// Delay after a failed fetch before retrying the same cursor (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Fixed delay between consecutive requests of one stream (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Number of feed entries requested per page
    #[serde(rename = "feed-page-size", default = "default_feed_page_size")]
    pub feed_page_size: u32,

    /// Whether each post's comment tree is crawled before it is persisted
    #[serde(rename = "include-comments", default = "default_true")]
    pub include_comments: bool,

    /// Ordering requested for root comments
    #[serde(default)]
    pub ranking: Ranking,
}

/// Root comment ordering understood by the comment queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ranking {
    AllComments,
    #[default]
    MostRelevant,
    Newest,
}

impl Ranking {
    /// Returns the intent token sent with comment queries
    pub fn intent_token(&self) -> &'static str {
        match self {
            Self::AllComments => "RANKED_UNFILTERED_CHRONOLOGICAL_REPLIES_INTENT_V1",
            Self::MostRelevant => "RANKED_FILTERED_INTENT_V1",
            Self::Newest => "REVERSE_CHRONOLOGICAL_UNFILTERED_INTENT_V1",
        }
    }
}

/// The feed being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Public URL of the feed owner, used to name output files
    #[serde(rename = "page-url")]
    pub page_url: String,

    /// Resource key of the feed stream
    #[serde(rename = "page-id")]
    pub page_id: String,

    /// Only posts created after this instant (YYYY-MM-DD_HH-MM-SS, UTC)
    #[serde(default)]
    pub after: Option<String>,

    /// Only posts created before this instant (YYYY-MM-DD_HH-MM-SS, UTC)
    #[serde(default)]
    pub before: Option<String>,
}

/// Remote endpoint and session
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Query endpoint URL
    pub endpoint: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Session headers (cookie, accept-language, ...) sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Locations of the persisted lookup tables
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// JSON file mapping query names to opaque identifiers
    #[serde(rename = "queries-path")]
    pub queries_path: String,

    /// JSON file mapping reaction identifiers to names
    #[serde(rename = "reactions-path")]
    pub reactions_path: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the JSONL post files
    pub directory: String,

    /// Directory receiving downloaded images
    #[serde(rename = "media-directory")]
    pub media_directory: String,

    /// Whether image attachments are downloaded
    #[serde(rename = "download-media", default = "default_true")]
    pub download_media: bool,

    /// Whether posts already present in the output file are skipped
    #[serde(default = "default_true")]
    pub deduplicate: bool,
}

fn default_true() -> bool {
    true
}

fn default_feed_page_size() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("feed-harvester/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}
