//! Comment thread crawl
//!
//! Root comments of a post are collected first. Each root comment with a
//! non-zero reply count then gets its own reply stream, with its own target
//! and retry budget, before the thread is handed back to the feed crawl.
//!
//! The root stream needs the root and pagination queries. The reply query is
//! looked up on its own: without it, root comments are still collected and
//! carry empty reply lists.

use crate::catalog::{
    QueryCatalog, ReactionTable, MORE_COMMENTS_QUERY, REPLIES_QUERY, ROOT_COMMENTS_QUERY,
};
use crate::engine::{fetch_documents, HarvestSettings};
use crate::extract::shape::{PointerShape, REPLY_SHAPES, ROOT_COMMENT_SHAPES};
use crate::extract::{
    extract_comment_page, Comment, CommentBody, CommentPage, CommentThread, ExtractedComment,
    Reply, ThreadMeta,
};
use crate::media::MediaStore;
use crate::pagination::{
    collect_stream, FetchError, Page, PageCursor, PageSource, StreamOutcome, Termination,
};
use crate::transport::{QueryRequest, Transport};
use crate::CatalogResult;
use async_trait::async_trait;
use serde_json::Value;

const RELAY_WORK_USER_FLAG: &str = "__relay_internal__pv__IsWorkUserrelayprovider";

/// Query identifiers of the root comment stream
#[derive(Debug, Clone, Copy)]
pub(crate) struct CommentQueries<'a> {
    root: &'a str,
    more: &'a str,
}

impl<'a> CommentQueries<'a> {
    pub(crate) fn resolve(catalog: &'a QueryCatalog) -> CatalogResult<Self> {
        Ok(Self {
            root: catalog.lookup(ROOT_COMMENTS_QUERY)?,
            more: catalog.lookup(MORE_COMMENTS_QUERY)?,
        })
    }
}

/// A post's comment thread with the stream statistics behind it
#[derive(Debug, Clone, Default)]
pub(crate) struct ThreadOutcome {
    pub thread: CommentThread,
    pub root_abandoned: bool,
    pub replies_collected: usize,
    pub reply_streams_abandoned: usize,
}

/// Everything a comment or reply stream reads; holds no mutable state
pub(crate) struct ThreadCrawler<'a, T> {
    transport: &'a T,
    reactions: &'a ReactionTable,
    media: &'a MediaStore,
    settings: &'a HarvestSettings,
    /// `None` when the catalog has no reply query
    replies_query: Option<&'a str>,
}

impl<'a, T: Transport> ThreadCrawler<'a, T> {
    pub(crate) fn new(
        transport: &'a T,
        reactions: &'a ReactionTable,
        media: &'a MediaStore,
        settings: &'a HarvestSettings,
        catalog: &'a QueryCatalog,
    ) -> Self {
        let replies_query = match catalog.lookup(REPLIES_QUERY) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Replies will not be collected: {}", e);
                None
            }
        };

        Self {
            transport,
            reactions,
            media,
            settings,
            replies_query,
        }
    }

    /// Collects root comments, then the replies of each one in order
    pub(crate) async fn crawl_thread(
        &self,
        queries: CommentQueries<'_>,
        post_url: &str,
        feedback_id: &str,
    ) -> ThreadOutcome {
        tracing::debug!(post_url = %post_url, "Collecting comments");

        let mut source = RootCommentSource {
            crawler: self,
            queries,
            feedback_id,
            total_count: None,
            root_count: None,
        };
        let roots = collect_stream(
            "root-comments",
            &mut source,
            &self.settings.policy,
            self.settings.max_root_comments,
        )
        .await;

        if roots.abandoned() {
            tracing::warn!(
                post_url = %post_url,
                "Root comment stream abandoned with {} comments",
                roots.items.len()
            );
        }

        let mut outcome = ThreadOutcome {
            root_abandoned: roots.abandoned(),
            ..Default::default()
        };
        let mut comments = Vec::with_capacity(roots.items.len());

        for extracted in roots.items {
            let body = self.materialize(extracted.body, extracted.media_uri).await;
            let replies = self.crawl_replies(&extracted.thread).await;
            if replies.abandoned() {
                outcome.reply_streams_abandoned += 1;
            }
            outcome.replies_collected += replies.items.len();
            comments.push(Comment {
                body,
                replies: replies.items,
            });
        }

        tracing::debug!(
            post_url = %post_url,
            comments = comments.len(),
            replies = outcome.replies_collected,
            "Comment thread complete"
        );

        outcome.thread = CommentThread {
            total_count: source.total_count,
            root_count: source.root_count,
            comments,
        };
        outcome
    }

    /// Collects the replies of one root comment
    ///
    /// No request is issued when the reply count is zero, the stream keys
    /// are missing or the catalog has no reply query.
    pub(crate) async fn crawl_replies(&self, meta: &ThreadMeta) -> StreamOutcome<Reply> {
        let empty = StreamOutcome {
            items: Vec::new(),
            fetches: 0,
            termination: Termination::Exhausted,
        };
        let Some((feedback_id, expansion_token)) = meta.reply_stream() else {
            return empty;
        };
        let Some(query_id) = self.replies_query else {
            tracing::debug!(
                replies = meta.reply_count,
                "No reply query, leaving replies empty"
            );
            return empty;
        };

        let mut source = ReplySource {
            crawler: self,
            query_id,
            feedback_id,
            expansion_token,
        };
        let outcome = collect_stream(
            "replies",
            &mut source,
            &self.settings.policy,
            self.settings.max_replies,
        )
        .await;

        let mut replies = Vec::with_capacity(outcome.items.len());
        for extracted in outcome.items {
            replies.push(self.materialize(extracted.body, extracted.media_uri).await);
        }

        StreamOutcome {
            items: replies,
            fetches: outcome.fetches,
            termination: outcome.termination,
        }
    }

    async fn materialize(&self, mut body: CommentBody, media_uri: Option<String>) -> CommentBody {
        if let Some(uri) = media_uri {
            body.media = self.media.materialize(&uri).await;
        }
        body
    }

    async fn fetch_comment_page(
        &self,
        request: &QueryRequest,
        shapes: &[PointerShape],
    ) -> Result<CommentPage, FetchError> {
        let documents = fetch_documents(self.transport, request).await?;
        first_comment_page(&documents, shapes, self.reactions).ok_or_else(|| {
            FetchError::Extraction("no comment connection in response".to_string())
        })
    }
}

fn first_comment_page(
    documents: &[Value],
    shapes: &[PointerShape],
    reactions: &ReactionTable,
) -> Option<CommentPage> {
    documents
        .iter()
        .find_map(|doc| extract_comment_page(doc, shapes, reactions).into_record())
}

/// Root comments of one post
struct RootCommentSource<'c, 'a, T> {
    crawler: &'c ThreadCrawler<'a, T>,
    queries: CommentQueries<'c>,
    feedback_id: &'c str,
    total_count: Option<u64>,
    root_count: Option<u64>,
}

#[async_trait]
impl<'c, 'a, T: Transport> PageSource for RootCommentSource<'c, 'a, T> {
    type Item = ExtractedComment;

    async fn fetch_page(&mut self, cursor: &PageCursor) -> Result<Page<Self::Item>, FetchError> {
        let queries = self.queries;
        let request = if cursor.is_initial() {
            QueryRequest::new(queries.root, self.feedback_id)
        } else {
            QueryRequest::new(queries.more, self.feedback_id)
                .with_cursor("commentsAfterCursor", cursor.cursor.as_str())
                .with_variable("commentsAfterCount", -1)
        }
        .with_variable(
            "commentsIntentToken",
            self.crawler.settings.ranking.intent_token(),
        )
        .with_variable("scale", 1)
        .with_variable(RELAY_WORK_USER_FLAG, "false");

        let page = self
            .crawler
            .fetch_comment_page(&request, ROOT_COMMENT_SHAPES)
            .await?;

        if page.total_count.is_some() {
            self.total_count = page.total_count;
        }
        if page.root_count.is_some() {
            self.root_count = page.root_count;
        }

        Ok(Page {
            items: page.comments,
            next: page.next,
        })
    }
}

/// Direct replies of one root comment
struct ReplySource<'c, 'a, T> {
    crawler: &'c ThreadCrawler<'a, T>,
    query_id: &'c str,
    feedback_id: &'c str,
    expansion_token: &'c str,
}

#[async_trait]
impl<'c, 'a, T: Transport> PageSource for ReplySource<'c, 'a, T> {
    type Item = ExtractedComment;

    async fn fetch_page(&mut self, cursor: &PageCursor) -> Result<Page<Self::Item>, FetchError> {
        let mut request = QueryRequest::new(self.query_id, self.feedback_id)
            .with_variable("expansionToken", self.expansion_token)
            .with_variable("scale", 1)
            .with_variable(RELAY_WORK_USER_FLAG, "false");
        if !cursor.cursor.is_empty() {
            request = request.with_cursor("repliesAfterCursor", cursor.cursor.as_str());
        }

        let page = self.crawler.fetch_comment_page(&request, REPLY_SHAPES).await?;
        Ok(Page {
            items: page.comments,
            next: page.next,
        })
    }
}
