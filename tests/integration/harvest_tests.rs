//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the query endpoint and the media
//! CDN, and run full harvests from a TOML configuration file.

use feed_harvester::config::load_config;
use feed_harvester::{
    FeedRequest, HarvestSettings, Harvester, HttpTransport, JsonlSink, MediaStore, Post,
    QueryCatalog, ReactionTable, Termination,
};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches a form-encoded query by `doc_id` and one of its variables
struct Query {
    doc_id: &'static str,
    variable: &'static str,
    value: Value,
}

fn query(doc_id: &'static str, variable: &'static str, value: impl Into<Value>) -> Query {
    Query {
        doc_id,
        variable,
        value: value.into(),
    }
}

impl Match for Query {
    fn matches(&self, request: &Request) -> bool {
        let mut doc_id = None;
        let mut variables = None;
        for (key, value) in url::form_urlencoded::parse(&request.body) {
            match key.as_ref() {
                "doc_id" => doc_id = Some(value.into_owned()),
                "variables" => variables = serde_json::from_str::<Value>(&value).ok(),
                _ => {}
            }
        }

        doc_id.as_deref() == Some(self.doc_id)
            && variables
                .as_ref()
                .and_then(|v| v.get(self.variable))
                == Some(&self.value)
    }
}

fn body(documents: &[Value]) -> String {
    documents
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn feed_entry(n: u32, image_uri: Option<String>) -> Value {
    let attachments = match image_uri {
        Some(uri) => json!([{"styles": {"attachment": {"media": {
            "__typename": "Photo",
            "photo_image": {"uri": uri}
        }}}}]),
        None => json!([]),
    };

    json!({"data": {"node": {
        "feedback": {"id": format!("post-{}", n)},
        "comet_sections": {
            "timestamp": {"story": {"creation_time": 1_750_000_000 + n}},
            "content": {"story": {
                "wwwURL": format!("https://www.example.com/K14vn/posts/{}", n),
                "comet_sections": {"message": {"story": {"message": {
                    "text": format!("Post number {}\nNguồn: wire", n)
                }}}},
                "attachments": attachments
            }},
            "feedback": {"story": {"story_ufi_container": {"story": {"feedback_context": {
                "feedback_target_with_context": {
                    "comet_ufi_summary_and_actions_renderer": {"feedback": {
                        "i18n_share_count": "4",
                        "reaction_count": {"count": 9},
                        "top_reactions": {"edges": [
                            {"node": {"id": "1635855486666999"}, "reaction_count": 9}
                        ]}
                    }},
                    "comment_list_renderer": {"feedback": {"comment_rendering_instance": {
                        "comments": {"total_count": 1}
                    }}}
                }
            }}}}}
        }
    }}})
}

fn write_file(path: &Path, content: &str) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn write_config(dir: &Path, endpoint: &str, download_media: bool) -> std::path::PathBuf {
    write_file(
        &dir.join("queries.json"),
        r#"{
            "ProfileCometTimelineFeedRefetchQuery": 1001,
            "CommentListComponentsRootQuery": "2001",
            "CommentsListComponentsPaginationQuery": "2002",
            "Depth1CommentsListPaginationQuery": "3001"
        }"#,
    );
    write_file(
        &dir.join("reactions.json"),
        r#"{"reactions": {"1635855486666999": {"name": "Like"}}}"#,
    );

    let config = format!(
        r#"
[crawler]
max-posts = 10
max-root-comments = 20
max-replies = 20
max-retry = 3
retry-delay-ms = 0
request-delay-ms = 0

[feed]
page-url = "https://www.example.com/K14vn"
page-id = "100064597340419"
before = "2025-06-26_07-38-00"

[transport]
endpoint = "{endpoint}"

[transport.headers]
cookie = "datr=abc"

[catalog]
queries-path = "{dir}/queries.json"
reactions-path = "{dir}/reactions.json"

[output]
directory = "{dir}/json"
media-directory = "{dir}/image"
download-media = {download_media}
"#,
        endpoint = endpoint,
        dir = dir.display(),
        download_media = download_media,
    );
    let path = dir.join("harvest.toml");
    write_file(&path, &config);
    path
}

fn build_harvester(
    config: &feed_harvester::Config,
) -> Harvester<HttpTransport, JsonlSink> {
    let transport = HttpTransport::new(&config.transport).unwrap();
    let media = if config.output.download_media {
        MediaStore::new(transport.client().clone(), &config.output.media_directory)
    } else {
        MediaStore::disabled()
    };
    Harvester::new(
        transport,
        QueryCatalog::load(Path::new(&config.catalog.queries_path)).unwrap(),
        ReactionTable::load(Path::new(&config.catalog.reactions_path)).unwrap(),
        media,
        JsonlSink::new(config.output.deduplicate),
        HarvestSettings::from(&config.crawler),
    )
}

fn read_posts(path: &Path) -> Vec<Post> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_full_harvest_with_comments_and_media() {
    let server = MockServer::start().await;
    let endpoint = format!("{}/api/graphql/", server.uri());
    let image_uri = format!("{}/cdn/photo_1.jpg?stp=dst-jpg", server.uri());

    // feed page 1: one post + cursor, page 2: end of feed
    Mock::given(method("POST"))
        .and(path("/api/graphql/"))
        .and(query("1001", "cursor", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(body(&[
            feed_entry(1, Some(image_uri.clone())),
            json!({"data": {"page_info": {"has_next_page": true, "end_cursor": "feed-2"}}}),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query("1001", "cursor", "feed-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body(&[json!(
            {"data": {"page_info": {"has_next_page": false, "end_cursor": null}}}
        )])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query("2001", "id", "post-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body(&[json!(
            {"data": {"node": {"comment_rendering_instance_for_feed_location": {"comments": {
                "edges": [{"node": {
                    "body": {"text": "First!"},
                    "feedback": {
                        "id": "comment-1",
                        "reactors": {"count_reduced": "3"},
                        "top_reactions": {"edges": [
                            {"node": {"id": "1635855486666999"}, "reaction_count": 3}
                        ]},
                        "replies_fields": {"total_count": 1},
                        "expansion_info": {"expansion_token": "exp-1"}
                    }
                }}],
                "page_info": {"has_next_page": false, "end_cursor": null},
                "total_count": 2,
                "count": 1
            }}}}}
        )])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query("3001", "expansionToken", "exp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body(&[json!(
            {"data": {"node": {"replies_connection": {
                "edges": [{"node": {"body": {"text": "Agreed"}, "feedback": {"id": "reply-1"}}}],
                "page_info": {"has_next_page": false}
            }}}}
        )])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cdn/photo_1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\xff\xd8\xff".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = load_config(&write_config(dir.path(), &endpoint, true)).unwrap();
    let request = FeedRequest::from_config(&config).unwrap();
    let mut harvester = build_harvester(&config);

    let report = harvester.crawl_feed(&request).await.unwrap();

    assert_eq!(report.feed_fetches, 2);
    assert_eq!(report.posts_persisted, 1);
    assert_eq!(report.termination, Termination::Exhausted);
    assert!(request
        .output_path
        .to_string_lossy()
        .ends_with("posts_K14vn_1750923480.jsonl"));

    let posts = read_posts(&request.output_path);
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.content, "Post number 1");
    assert_eq!(post.share_count.as_deref(), Some("4"));
    assert_eq!(post.reactions.detail["Like"], 9);
    assert_eq!(post.media.len(), 1);
    assert!(post.media[0].ends_with("photo_1.jpg"));
    assert!(Path::new(&post.media[0]).exists());

    let thread = post.comments.as_ref().unwrap();
    assert_eq!(thread.total_count, Some(2));
    assert_eq!(thread.comments[0].body.text, "First!");
    assert_eq!(thread.comments[0].body.reactions.detail["Like"], 3);
    assert_eq!(thread.comments[0].replies[0].text, "Agreed");
}

#[tokio::test]
async fn test_server_errors_abandon_feed_and_keep_output() {
    let server = MockServer::start().await;
    let endpoint = format!("{}/api/graphql/", server.uri());

    Mock::given(method("POST"))
        .and(query("1001", "cursor", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(body(&[
            feed_entry(1, None),
            feed_entry(2, None),
            json!({"data": {"page_info": {"has_next_page": true, "end_cursor": "feed-2"}}}),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query("1001", "cursor", "feed-2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = load_config(&write_config(dir.path(), &endpoint, false)).unwrap();
    config.crawler.include_comments = false;
    let request = FeedRequest::from_config(&config).unwrap();

    let report = build_harvester(&config)
        .crawl_feed(&request)
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::RetryBudgetExceeded);
    assert_eq!(report.feed_fetches, 4);
    assert_eq!(report.posts_persisted, 2);

    let posts = read_posts(&request.output_path);
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.comments.is_none() && p.media.is_empty()));
}

#[tokio::test]
async fn test_second_run_appends_only_new_posts() {
    let server = MockServer::start().await;
    let endpoint = format!("{}/api/graphql/", server.uri());

    Mock::given(method("POST"))
        .and(query("1001", "cursor", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(body(&[
            feed_entry(1, None),
            json!({"data": {"page_info": {"has_next_page": false}}}),
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query("1001", "cursor", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(body(&[
            feed_entry(2, None),
            feed_entry(1, None),
            json!({"data": {"page_info": {"has_next_page": false}}}),
        ])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = load_config(&write_config(dir.path(), &endpoint, false)).unwrap();
    config.crawler.include_comments = false;
    let request = FeedRequest::from_config(&config).unwrap();

    let first = build_harvester(&config).crawl_feed(&request).await.unwrap();
    let second = build_harvester(&config).crawl_feed(&request).await.unwrap();

    assert_eq!(first.posts_persisted, 1);
    assert_eq!(second.posts_persisted, 1);
    assert_eq!(second.duplicates_skipped, 1);

    let urls: Vec<_> = read_posts(&request.output_path)
        .into_iter()
        .map(|p| p.url)
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://www.example.com/K14vn/posts/1",
            "https://www.example.com/K14vn/posts/2"
        ]
    );
}
