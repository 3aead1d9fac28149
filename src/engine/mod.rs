//! Crawl engine
//!
//! This module drives the three nested streams of a harvest:
//! - the feed stream, one page at a time, persisting each completed post
//! - one root comment stream per post
//! - one reply stream per root comment with a non-zero reply count
//!
//! Every fetch is awaited before the next one is issued. Failures are
//! absorbed by the stream that produced them; only a missing feed query and
//! sink failures leave a feed harvest as errors. A missing comment or reply
//! query only disables the streams that need it.

mod comments;
mod feed;

pub use feed::{refresh_reactions, FeedPage};

use crate::catalog::{
    QueryCatalog, ReactionTable, FEED_QUERY, MORE_COMMENTS_QUERY, REPLIES_QUERY,
    ROOT_COMMENTS_QUERY,
};
use crate::config::{Config, CrawlerConfig, Ranking, TimeWindow};
use crate::extract::{CommentThread, Reply, ThreadMeta};
use crate::media::MediaStore;
use crate::pagination::{FetchError, RetryPolicy, Termination};
use crate::sink::Sink;
use crate::transport::{QueryRequest, Transport};
use crate::{CatalogResult, ConfigResult, TransportError};
use comments::{CommentQueries, ThreadCrawler};
use serde_json::Value;
use std::path::PathBuf;

/// Query names every harvest needs, given whether comments are collected
pub fn required_queries(include_comments: bool) -> &'static [&'static str] {
    const FEED_ONLY: &[&str] = &[FEED_QUERY];
    const WITH_COMMENTS: &[&str] = &[
        FEED_QUERY,
        ROOT_COMMENTS_QUERY,
        MORE_COMMENTS_QUERY,
        REPLIES_QUERY,
    ];
    if include_comments {
        WITH_COMMENTS
    } else {
        FEED_ONLY
    }
}

/// Per-run crawl limits and pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSettings {
    pub policy: RetryPolicy,
    pub max_root_comments: usize,
    pub max_replies: usize,
    pub feed_page_size: u32,
    pub ranking: Ranking,
}

impl From<&CrawlerConfig> for HarvestSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            policy: RetryPolicy::from(config),
            max_root_comments: config.max_root_comments,
            max_replies: config.max_replies,
            feed_page_size: config.feed_page_size,
            ranking: config.ranking,
        }
    }
}

/// One feed harvest to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    /// Resource key of the feed stream
    pub page_id: String,
    pub window: TimeWindow,
    pub max_posts: usize,
    pub include_comments: bool,
    /// JSONL destination for completed posts
    pub output_path: PathBuf,
}

impl FeedRequest {
    /// Builds the request described by the configuration
    ///
    /// Output lands in `<directory>/posts_<page name>_<before>.jsonl`.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let window = config.feed.time_window()?;
        let file_name = format!("posts_{}_{}.jsonl", config.feed.page_name(), window.before);

        Ok(Self {
            page_id: config.feed.page_id.clone(),
            window,
            max_posts: config.crawler.max_posts,
            include_comments: config.crawler.include_comments,
            output_path: PathBuf::from(&config.output.directory).join(file_name),
        })
    }
}

/// What a feed harvest did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReport {
    pub posts_persisted: usize,
    /// Posts already present at the destination
    pub duplicates_skipped: usize,
    /// Feed entries that produced no record
    pub entries_skipped: usize,
    pub feed_fetches: usize,
    pub termination: Termination,
    pub comments_collected: usize,
    pub replies_collected: usize,
    pub comment_streams_abandoned: usize,
    pub reply_streams_abandoned: usize,
    /// Catalog queries the harvest needed but could not resolve
    pub missing_queries: Vec<String>,
    pub output_path: PathBuf,
}

/// Runs harvests against one transport, writing completed posts to one sink
///
/// The catalog, reaction table and settings are fixed at construction and
/// shared by reference with every stream of every harvest.
pub struct Harvester<T, S> {
    transport: T,
    catalog: QueryCatalog,
    reactions: ReactionTable,
    media: MediaStore,
    sink: S,
    settings: HarvestSettings,
}

impl<T: Transport, S: Sink> Harvester<T, S> {
    pub fn new(
        transport: T,
        catalog: QueryCatalog,
        reactions: ReactionTable,
        media: MediaStore,
        sink: S,
        settings: HarvestSettings,
    ) -> Self {
        Self {
            transport,
            catalog,
            reactions,
            media,
            sink,
            settings,
        }
    }

    pub fn settings(&self) -> &HarvestSettings {
        &self.settings
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Collects one post's root comments and their replies
    ///
    /// Fails only when a root comment query is missing from the catalog.
    /// Without the reply query, comments carry empty reply lists.
    pub async fn crawl_comments(
        &self,
        post_url: &str,
        feedback_id: &str,
    ) -> CatalogResult<CommentThread> {
        let queries = CommentQueries::resolve(&self.catalog)?;
        let outcome = self
            .thread_crawler()
            .crawl_thread(queries, post_url, feedback_id)
            .await;
        Ok(outcome.thread)
    }

    /// Collects one root comment's replies
    ///
    /// Returns an empty list without fetching when the comment has no
    /// replies or lacks the keys needed to request them. Fails when the
    /// reply query is missing from the catalog.
    pub async fn crawl_replies(&self, meta: &ThreadMeta) -> CatalogResult<Vec<Reply>> {
        self.catalog.lookup(REPLIES_QUERY)?;
        Ok(self.thread_crawler().crawl_replies(meta).await.items)
    }

    fn thread_crawler(&self) -> ThreadCrawler<'_, T> {
        ThreadCrawler::new(
            &self.transport,
            &self.reactions,
            &self.media,
            &self.settings,
            &self.catalog,
        )
    }
}

/// Executes one request and decodes its documents
///
/// A non-200 status is a transport failure; a body without any JSON
/// document is a whole-page extraction failure.
pub(crate) async fn fetch_documents<T: Transport + ?Sized>(
    transport: &T,
    request: &QueryRequest,
) -> Result<Vec<Value>, FetchError> {
    let response = transport.execute(request).await?;
    if response.status != 200 {
        return Err(TransportError::Status {
            status: response.status,
        }
        .into());
    }
    if response.body.as_ref().map_or(true, Vec::is_empty) {
        return Err(TransportError::EmptyBody.into());
    }

    let documents = response.documents();
    if documents.is_empty() {
        return Err(FetchError::Extraction(
            "response carried no JSON document".to_string(),
        ));
    }
    Ok(documents)
}
