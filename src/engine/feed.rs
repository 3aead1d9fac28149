//! Feed crawl
//!
//! The feed stream is driven page by page. Every post is completed (media
//! stored, comment thread collected) and appended to the sink before the
//! next entry is looked at, so output order mirrors feed order.

use crate::catalog::{
    QueryCatalog, ReactionTable, FEED_QUERY, MORE_COMMENTS_QUERY, REPLIES_QUERY,
    ROOT_COMMENTS_QUERY,
};
use crate::engine::comments::{CommentQueries, ThreadCrawler};
use crate::engine::{fetch_documents, FeedReport, FeedRequest, HarvestSettings, Harvester};
use crate::extract::{
    extract_post, feed_page_cursor, CommentThread, ExtractedPost, Extraction, Post,
};
use crate::media::MediaStore;
use crate::pagination::{FetchError, PageCursor, PageStream, RetryCounter, Termination};
use crate::sink::{AppendOutcome, Sink};
use crate::transport::{QueryRequest, Transport};
use crate::Result;
use serde_json::Value;

/// Decoded feed page: raw entries plus the feed's next cursor
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub entries: Vec<Value>,
    /// `None` when no document carried the feed's `page_info`
    pub next: Option<PageCursor>,
}

impl FeedPage {
    /// Splits a response into entries and the page cursor
    ///
    /// Documents that only carry the feed's `page_info` are not entries.
    pub fn from_documents(documents: Vec<Value>) -> Self {
        let next = feed_page_cursor(&documents);
        let entries = documents
            .into_iter()
            .filter(|doc| doc.pointer("/data/page_info").is_none())
            .collect();
        Self { entries, next }
    }
}

fn feed_query(
    query_id: &str,
    request: &FeedRequest,
    page_size: u32,
    cursor: &PageCursor,
) -> QueryRequest {
    QueryRequest::new(query_id, request.page_id.as_str())
        .with_cursor("cursor", cursor.cursor.as_str())
        .with_variable("afterTime", request.window.after)
        .with_variable("beforeTime", request.window.before)
        .with_variable("count", page_size)
}

async fn fetch_feed_page<T: Transport>(
    transport: &T,
    request: &QueryRequest,
) -> std::result::Result<FeedPage, FetchError> {
    Ok(FeedPage::from_documents(
        fetch_documents(transport, request).await?,
    ))
}

impl<T: Transport, S: Sink> Harvester<T, S> {
    /// Runs one feed harvest
    ///
    /// Every completed post is appended to `request.output_path` as soon as
    /// its comment thread is collected. Stream termination, including an
    /// abandoned feed stream, is reported rather than raised. Errors are
    /// limited to a missing feed query, detected before the first fetch, and
    /// sink failures. Without the root comment queries posts are persisted
    /// without a comment thread; without the reply query comments are
    /// persisted without replies. Either case is listed in
    /// [`FeedReport::missing_queries`].
    pub async fn crawl_feed(&mut self, request: &FeedRequest) -> Result<FeedReport> {
        let feed_query_id = self.catalog.lookup(FEED_QUERY)?;
        let mut missing_queries = Vec::new();

        let threads = if request.include_comments {
            let crawler = ThreadCrawler::new(
                &self.transport,
                &self.reactions,
                &self.media,
                &self.settings,
                &self.catalog,
            );
            if !self.catalog.contains(REPLIES_QUERY) {
                missing_queries.push(REPLIES_QUERY.to_string());
            }
            match CommentQueries::resolve(&self.catalog) {
                Ok(queries) => Some((crawler, queries)),
                Err(e) => {
                    tracing::warn!("Comments will not be collected: {}", e);
                    missing_queries.extend(
                        [ROOT_COMMENTS_QUERY, MORE_COMMENTS_QUERY]
                            .into_iter()
                            .filter(|name| !self.catalog.contains(name))
                            .map(str::to_string),
                    );
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            page_id = %request.page_id,
            after = request.window.after,
            before = request.window.before,
            max_posts = request.max_posts,
            "Starting feed harvest"
        );

        let mut report = FeedReport {
            posts_persisted: 0,
            duplicates_skipped: 0,
            entries_skipped: 0,
            feed_fetches: 0,
            termination: Termination::Exhausted,
            comments_collected: 0,
            replies_collected: 0,
            comment_streams_abandoned: 0,
            reply_streams_abandoned: 0,
            missing_queries,
            output_path: request.output_path.clone(),
        };
        let policy = self.settings.policy;
        let mut stream = PageStream::new("feed", request.max_posts, policy.max_retry);

        while let Some(cursor) = stream.next_cursor().cloned() {
            let query = feed_query(feed_query_id, request, self.settings.feed_page_size, &cursor);

            match fetch_feed_page(&self.transport, &query).await {
                Ok(page) => {
                    tracing::debug!(
                        cursor = %cursor.cursor,
                        entries = page.entries.len(),
                        has_next = page.next.as_ref().map(|next| next.has_next),
                        "Fetched feed page"
                    );

                    let mut added = 0;
                    for entry in &page.entries {
                        if added >= stream.remaining() {
                            break;
                        }

                        let extracted = match extract_post(entry, &self.reactions) {
                            Extraction::Record(extracted) => extracted,
                            Extraction::Empty(miss) => {
                                tracing::warn!(
                                    cursor = %cursor.cursor,
                                    "Skipping feed entry: {:?}",
                                    miss
                                );
                                report.entries_skipped += 1;
                                continue;
                            }
                        };

                        if self
                            .sink
                            .contains(&request.output_path, &extracted.post.record_key)?
                        {
                            tracing::debug!(post_url = %extracted.post.url, "Post already persisted");
                            report.duplicates_skipped += 1;
                            continue;
                        }

                        let post =
                            complete_post(extracted, &self.media, threads.as_ref(), &mut report)
                                .await;
                        match self.sink.append(&request.output_path, &post)? {
                            AppendOutcome::Written => {
                                added += 1;
                                report.posts_persisted += 1;
                                tracing::info!(
                                    post_url = %post.url,
                                    persisted = report.posts_persisted,
                                    "Persisted post"
                                );
                            }
                            AppendOutcome::Duplicate => report.duplicates_skipped += 1,
                        }
                    }

                    // entries are kept even when the cursor is unusable
                    match page.next {
                        None => {
                            stream.record_partial_page(
                                added,
                                &FetchError::Extraction("feed page carries no page_info".to_string()),
                            );
                        }
                        Some(next) if stream.is_stalled(&next) => {
                            stream.record_partial_page(
                                added,
                                &FetchError::StalledCursor(cursor.cursor.clone()),
                            );
                        }
                        Some(next) => stream.record_page(next, added),
                    }
                }
                Err(e) => {
                    stream.record_failure(&e);
                }
            }

            let delay = stream.pending_delay(&policy);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        report.feed_fetches = stream.fetches();
        report.termination = stream.termination().unwrap_or(Termination::Exhausted);

        tracing::info!(
            posts = report.posts_persisted,
            fetches = report.feed_fetches,
            termination = %report.termination,
            "Feed harvest finished"
        );
        Ok(report)
    }
}

/// Stores a post's media and attaches its comment thread
async fn complete_post<T: Transport>(
    extracted: ExtractedPost,
    media: &MediaStore,
    threads: Option<&(ThreadCrawler<'_, T>, CommentQueries<'_>)>,
    report: &mut FeedReport,
) -> Post {
    let ExtractedPost {
        mut post,
        media_uris,
    } = extracted;
    post.media = media.materialize_all(&media_uris).await;

    let Some((threads, queries)) = threads else {
        return post;
    };

    post.comments = Some(match post.feedback_id.as_deref() {
        Some(feedback_id) => {
            let outcome = threads
                .crawl_thread(*queries, &post.url, feedback_id)
                .await;
            report.comments_collected += outcome.thread.comments.len();
            report.replies_collected += outcome.replies_collected;
            report.reply_streams_abandoned += outcome.reply_streams_abandoned;
            if outcome.root_abandoned {
                report.comment_streams_abandoned += 1;
            }
            outcome.thread
        }
        None => {
            tracing::warn!(post_url = %post.url, "Post has no feedback id, skipping comments");
            CommentThread::default()
        }
    });
    post
}

/// Fetches the first feed page and reads the reaction identifier table it
/// carries
///
/// Retries the page up to the policy's budget. Returns `None` when no
/// response carried the table.
pub async fn refresh_reactions<T: Transport>(
    transport: &T,
    catalog: &QueryCatalog,
    request: &FeedRequest,
    settings: &HarvestSettings,
) -> Result<Option<ReactionTable>> {
    let query = feed_query(
        catalog.lookup(FEED_QUERY)?,
        request,
        settings.feed_page_size,
        &PageCursor::initial(),
    );
    let mut retry = RetryCounter::new(settings.policy.max_retry);

    loop {
        match fetch_documents(transport, &query).await {
            Ok(documents) => {
                let table = ReactionTable::discover(&documents);
                if table.is_none() {
                    tracing::warn!("Feed response carried no reaction identifier table");
                }
                return Ok(table);
            }
            Err(e) => {
                tracing::debug!(attempt = retry.count() + 1, "Reaction refresh failed: {}", e);
                if retry.record_failure() {
                    tracing::warn!("Giving up on reaction refresh after {} attempts", retry.count());
                    return Ok(None);
                }
                tokio::time::sleep(settings.policy.retry_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Ranking, TimeWindow};
    use crate::engine::testing::*;
    use crate::pagination::RetryPolicy;
    use crate::{CatalogError, HarvestError, JsonlSink};
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn settings() -> HarvestSettings {
        HarvestSettings {
            policy: RetryPolicy::immediate(3),
            max_root_comments: 50,
            max_replies: 50,
            feed_page_size: 3,
            ranking: Ranking::MostRelevant,
        }
    }

    fn request(dir: &Path, max_posts: usize, include_comments: bool) -> FeedRequest {
        FeedRequest {
            page_id: "page-1".to_string(),
            window: TimeWindow {
                after: 0,
                before: 1_760_000_000,
            },
            max_posts,
            include_comments,
            output_path: dir.join("posts_page_1760000000.jsonl"),
        }
    }

    fn harvester(
        transport: &ScriptedTransport,
        catalog: QueryCatalog,
    ) -> Harvester<&ScriptedTransport, JsonlSink> {
        Harvester::new(
            transport,
            catalog,
            ReactionTable::default(),
            MediaStore::disabled(),
            JsonlSink::new(true),
            settings(),
        )
    }

    fn persisted(path: &Path) -> Vec<Post> {
        std::fs::read_to_string(path)
            .map(|s| s.lines().map(|l| serde_json::from_str(l).unwrap()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_feed_stops_when_stream_exhausted() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[
                feed_entry(1, 0),
                feed_entry(2, 0),
                feed_entry(3, 0),
                feed_page_info("f1", true),
            ],
        );
        transport.push_documents(FEED_ID, "page-1", &[feed_page_info("", false)]);

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 10, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.feed_fetches, 2);
        assert_eq!(report.posts_persisted, 3);
        assert_eq!(report.termination, Termination::Exhausted);
        assert_eq!(transport.count(FEED_ID, "page-1"), 2);

        let posts = persisted(&request.output_path);
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].url, "https://www.example.com/page/posts/1");
        assert!(posts.iter().all(|p| p.comments.is_none()));

        let first = &transport.requests()[0];
        assert_eq!(first.cursor_value(), "");
        assert_eq!(first.variables["afterTime"], json!(0));
        assert_eq!(first.variables["beforeTime"], json!(1_760_000_000));
        assert_eq!(first.variables["count"], json!(3));
        assert_eq!(transport.requests()[1].cursor_value(), "f1");
    }

    #[tokio::test]
    async fn test_unknown_entry_is_skipped_and_page_continues() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[
                feed_entry(1, 0),
                json!({"label": "ad", "data": {"node": {"sponsored": true}}}),
                feed_entry(3, 0),
                feed_page_info("", false),
            ],
        );

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 10, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.entries_skipped, 1);
        assert_eq!(report.posts_persisted, 2);
        let urls: Vec<_> = persisted(&request.output_path)
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://www.example.com/page/posts/1",
                "https://www.example.com/page/posts/3"
            ]
        );
    }

    #[tokio::test]
    async fn test_max_posts_stops_mid_page() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[
                feed_entry(1, 0),
                feed_entry(2, 0),
                feed_entry(3, 0),
                feed_page_info("f1", true),
            ],
        );

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 2, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.posts_persisted, 2);
        assert_eq!(report.feed_fetches, 1);
        assert_eq!(report.termination, Termination::TargetReached);
    }

    #[tokio::test]
    async fn test_feed_retries_same_cursor_and_resets() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(FEED_ID, "page-1", &[feed_entry(1, 0), feed_page_info("f1", true)]);
        transport.push_failure(FEED_ID, "page-1");
        transport.push_failure(FEED_ID, "page-1");
        transport.push_documents(FEED_ID, "page-1", &[feed_entry(2, 0), feed_page_info("f2", true)]);
        transport.push_failure(FEED_ID, "page-1");
        transport.push_failure(FEED_ID, "page-1");
        transport.push_failure(FEED_ID, "page-1");

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 10, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.termination, Termination::RetryBudgetExceeded);
        assert_eq!(report.posts_persisted, 2);
        assert_eq!(report.feed_fetches, 7);

        let cursors: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| r.cursor_value().to_string())
            .collect();
        assert_eq!(cursors, vec!["", "f1", "f1", "f1", "f2", "f2", "f2"]);
    }

    #[tokio::test]
    async fn test_page_without_page_info_is_retried_without_duplicates() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(FEED_ID, "page-1", &[feed_entry(1, 0)]);
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[feed_entry(1, 0), feed_page_info("", false)],
        );

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 10, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.feed_fetches, 2);
        assert_eq!(report.posts_persisted, 1);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(persisted(&request.output_path).len(), 1);
    }

    #[tokio::test]
    async fn test_entries_kept_when_page_info_missing() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(FEED_ID, "page-1", &[feed_entry(1, 0), feed_entry(2, 0)]);
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[
                feed_entry(1, 0),
                feed_entry(2, 0),
                feed_entry(3, 0),
                feed_page_info("", false),
            ],
        );

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 10, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.feed_fetches, 2);
        assert_eq!(report.posts_persisted, 3);
        assert_eq!(report.duplicates_skipped, 2);
        assert_eq!(report.termination, Termination::Exhausted);

        let cursors: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| r.cursor_value().to_string())
            .collect();
        assert_eq!(cursors, vec!["", ""]);
        assert_eq!(persisted(&request.output_path).len(), 3);
    }

    #[tokio::test]
    async fn test_retried_entries_do_not_use_post_budget() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(FEED_ID, "page-1", &[feed_entry(1, 0), feed_entry(2, 0)]);
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[
                feed_entry(1, 0),
                feed_entry(2, 0),
                feed_entry(3, 0),
                feed_page_info("f1", true),
            ],
        );

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 3, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.posts_persisted, 3);
        assert_eq!(report.termination, Termination::TargetReached);
        assert_eq!(report.feed_fetches, 2);
    }

    #[tokio::test]
    async fn test_pages_without_page_info_keep_posts_when_abandoned() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        for _ in 0..3 {
            transport.push_documents(FEED_ID, "page-1", &[feed_entry(1, 0), feed_entry(2, 0)]);
        }

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 10, false);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.termination, Termination::RetryBudgetExceeded);
        assert_eq!(report.feed_fetches, 3);
        assert_eq!(report.posts_persisted, 2);
        assert_eq!(persisted(&request.output_path).len(), 2);
    }

    #[tokio::test]
    async fn test_stalled_cursor_is_bounded() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(FEED_ID, "page-1", &[feed_entry(1, 0), feed_page_info("same", true)]);
        for _ in 0..3 {
            transport.push_documents(FEED_ID, "page-1", &[feed_page_info("same", true)]);
        }

        let mut harvester = harvester(&transport, catalog());
        let report = harvester
            .crawl_feed(&request(dir.path(), 10, false))
            .await
            .unwrap();

        assert_eq!(report.termination, Termination::RetryBudgetExceeded);
        assert_eq!(report.feed_fetches, 4);
        assert_eq!(report.posts_persisted, 1);
    }

    #[tokio::test]
    async fn test_comments_attached_before_persisting() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[feed_entry(1, 2), feed_page_info("", false)],
        );
        transport.push_documents(
            ROOT_ID,
            "post-1",
            &[root_comment_page(
                vec![comment_edge("c1", 1), comment_edge("c2", 0)],
                "",
                false,
            )],
        );
        transport.push_documents(
            REPLIES_ID,
            "c1",
            &[reply_page(vec![comment_edge("r1", 0)], "", false)],
        );

        let mut harvester = harvester(&transport, catalog());
        let request = request(dir.path(), 10, true);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.comments_collected, 2);
        assert_eq!(report.replies_collected, 1);

        let posts = persisted(&request.output_path);
        let thread = posts[0].comments.as_ref().unwrap();
        assert_eq!(thread.comments.len(), 2);
        assert_eq!(thread.comments[0].replies[0].text, "comment r1");
        assert_eq!(posts[0].comment_count, 2);
    }

    #[tokio::test]
    async fn test_missing_feed_query_fails_before_any_fetch() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        let catalog = QueryCatalog::from_pairs([(ROOT_COMMENTS_QUERY, ROOT_ID)]);

        let mut harvester = harvester(&transport, catalog);
        let err = harvester
            .crawl_feed(&request(dir.path(), 10, true))
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Catalog(CatalogError::Missing(name)) if name == FEED_QUERY));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_comment_queries_persist_posts_without_comments() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[feed_entry(1, 4), feed_entry(2, 1), feed_page_info("", false)],
        );
        let catalog = QueryCatalog::from_pairs([(FEED_QUERY, FEED_ID), (REPLIES_QUERY, REPLIES_ID)]);

        let mut harvester = harvester(&transport, catalog);
        let request = request(dir.path(), 10, true);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.posts_persisted, 2);
        assert_eq!(
            report.missing_queries,
            vec![ROOT_COMMENTS_QUERY.to_string(), MORE_COMMENTS_QUERY.to_string()]
        );
        assert_eq!(transport.requests().len(), 1);

        let posts = persisted(&request.output_path);
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.comments.is_none()));
        assert_eq!(posts[0].comment_count, 4);
    }

    #[tokio::test]
    async fn test_missing_reply_query_persists_comments_without_replies() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[feed_entry(1, 3), feed_page_info("", false)],
        );
        transport.push_documents(
            ROOT_ID,
            "post-1",
            &[root_comment_page(
                vec![comment_edge("c1", 2), comment_edge("c2", 0)],
                "",
                false,
            )],
        );
        let catalog = QueryCatalog::from_pairs([
            (FEED_QUERY, FEED_ID),
            (ROOT_COMMENTS_QUERY, ROOT_ID),
            (MORE_COMMENTS_QUERY, MORE_ID),
        ]);

        let mut harvester = harvester(&transport, catalog);
        let request = request(dir.path(), 10, true);
        let report = harvester.crawl_feed(&request).await.unwrap();

        assert_eq!(report.posts_persisted, 1);
        assert_eq!(report.comments_collected, 2);
        assert_eq!(report.replies_collected, 0);
        assert_eq!(report.missing_queries, vec![REPLIES_QUERY.to_string()]);
        assert_eq!(transport.count(REPLIES_ID, "c1"), 0);

        let posts = persisted(&request.output_path);
        let thread = posts[0].comments.as_ref().unwrap();
        assert_eq!(thread.comments.len(), 2);
        assert!(thread.comments.iter().all(|c| c.replies.is_empty()));
    }

    #[tokio::test]
    async fn test_feed_only_harvest_needs_only_feed_query() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_documents(FEED_ID, "page-1", &[feed_entry(1, 0), feed_page_info("", false)]);
        let catalog = QueryCatalog::from_pairs([(FEED_QUERY, FEED_ID)]);

        let mut harvester = harvester(&transport, catalog);
        let report = harvester
            .crawl_feed(&request(dir.path(), 10, false))
            .await
            .unwrap();
        assert_eq!(report.posts_persisted, 1);
        assert!(report.missing_queries.is_empty());
    }

    #[tokio::test]
    async fn test_rerun_skips_persisted_posts_without_comment_fetch() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        for _ in 0..2 {
            transport.push_documents(
                FEED_ID,
                "page-1",
                &[feed_entry(1, 0), feed_page_info("", false)],
            );
        }
        transport.push_documents(
            ROOT_ID,
            "post-1",
            &[root_comment_page(vec![], "", false)],
        );

        let request = request(dir.path(), 10, true);
        harvester(&transport, catalog())
            .crawl_feed(&request)
            .await
            .unwrap();
        let report = harvester(&transport, catalog())
            .crawl_feed(&request)
            .await
            .unwrap();

        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(report.posts_persisted, 0);
        assert_eq!(transport.count(ROOT_ID, "post-1"), 1);
        assert_eq!(persisted(&request.output_path).len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_reactions_reads_module_definition() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new();
        transport.push_failure(FEED_ID, "page-1");
        transport.push_documents(
            FEED_ID,
            "page-1",
            &[json!({
                "data": {"page_info": {"has_next_page": false}},
                "extensions": {"sr_payload": {"ddd": {"jsmods": {"define": [
                    ["DynamicUFIReactionTypes", [], {
                        "1635855486666999": {"name": "Like"}
                    }, 0]
                ]}}}}
            })],
        );

        let request = request(dir.path(), 10, false);
        let table = refresh_reactions(&transport, &catalog(), &request, &settings())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(table.resolve("1635855486666999"), Some("Like"));
        assert_eq!(transport.requests().len(), 2);
    }
}
