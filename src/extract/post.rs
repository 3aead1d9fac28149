//! Feed entry extraction
//!
//! Each field is read independently through [`Lookup`], so a missing branch
//! only defaults that one field. The only hard requirement for a record is
//! the post URL; without it the entry is an empty record.

use crate::catalog::ReactionTable;
use crate::extract::path::Lookup;
use crate::extract::reactions::post_reactions;
use crate::extract::shape::{first_match, FEED_ENTRY_SHAPES, FEED_PAGE_INFO_POINTERS};
use crate::extract::types::{record_key, Extraction, ExtractedPost, Miss, Post};
use crate::pagination::PageCursor;
use serde_json::Value;

/// Markers after which post text is a source attribution rather than content
const ATTRIBUTION_MARKERS: &[&str] = &["Theo:", "Nguồn:", "Cre:"];

const STORY: &str = "/comet_sections/content/story";
const FEEDBACK_TARGET: &str =
    "/comet_sections/feedback/story/story_ufi_container/story/feedback_context/feedback_target_with_context";

/// Extracts one feed entry document into a post
pub fn extract_post(document: &Value, reactions: &ReactionTable) -> Extraction<ExtractedPost> {
    let Some((shape, node)) = first_match(FEED_ENTRY_SHAPES, document) else {
        tracing::debug!("Feed entry matches no known envelope shape");
        return Extraction::Empty(Miss::UnknownShape);
    };

    let node = Lookup::new(node);
    let story = node.at(STORY);

    let Some(url) = story.at("/wwwURL").string() else {
        tracing::warn!(shape, "Feed entry has no post URL");
        return Extraction::Empty(Miss::MissingUrl);
    };
    tracing::debug!(shape, post_url = %url, "Extracted feed entry");

    let content = clean_content(&story.at("/comet_sections/message/story/message/text").text());
    let media_uris = attachment_image_uris(story.at("/attachments"));

    let target = node.at(FEEDBACK_TARGET);
    let summary = target.at("/comet_ufi_summary_and_actions_renderer/feedback");
    let reactions = post_reactions(summary, reactions);
    let share_count = summary.at("/i18n_share_count").string();
    let comment_count = target
        .at("/comment_list_renderer/feedback/comment_rendering_instance/comments/total_count")
        .count_or_zero();

    let feedback_id = node.at("/feedback/id").string();
    let created_at = node.at("/comet_sections/timestamp/story/creation_time").i64();

    Extraction::Record(ExtractedPost {
        post: Post {
            record_key: record_key(feedback_id.as_deref(), &url),
            content,
            media: Vec::new(),
            reactions,
            share_count,
            comment_count,
            url,
            feedback_id,
            created_at,
            comments: None,
        },
        media_uris,
    })
}

/// Reads the feed stream's next cursor from a page's documents
///
/// The last document carrying a `page_info` wins. Returns `None` when no
/// document carries a usable one.
pub fn feed_page_cursor(documents: &[Value]) -> Option<PageCursor> {
    let mut found = None;
    for doc in documents {
        let info = FEED_PAGE_INFO_POINTERS
            .iter()
            .find_map(|pointer| doc.pointer(pointer));
        if let Some(cursor) = info.and_then(PageCursor::from_page_info) {
            found = Some(cursor);
        }
    }
    found
}

/// Flattens line breaks and cuts a trailing source attribution
pub fn clean_content(raw: &str) -> String {
    let flattened = raw.replace(['\n', '\r'], " ");
    let end = ATTRIBUTION_MARKERS
        .iter()
        .filter_map(|marker| flattened.find(marker))
        .min()
        .unwrap_or(flattened.len());
    flattened[..end].trim().to_string()
}

/// Collects image URIs from post attachments, skipping videos
///
/// Albums list their photos under `all_subattachments.nodes`; single photos
/// carry `media.photo_image`.
pub fn attachment_image_uris(attachments: Lookup<'_>) -> Vec<String> {
    let mut uris = Vec::new();

    for attachment in attachments.array() {
        let attachment = Lookup::new(attachment).at("/styles/attachment");
        if is_video(attachment.at("/media")) {
            continue;
        }

        let subattachments = attachment.at("/all_subattachments");
        if subattachments.exists() {
            for node in subattachments.at("/nodes").array() {
                let media = Lookup::new(node).at("/media");
                if is_video(media) {
                    continue;
                }
                if let Some(uri) = media.at("/viewer_image/uri").string() {
                    uris.push(uri);
                }
            }
        } else if let Some(uri) = attachment.at("/media/photo_image/uri").string() {
            uris.push(uri);
        }
    }

    uris
}

fn is_video(media: Lookup<'_>) -> bool {
    media.at("/__typename").str() == Some("Video")
}
