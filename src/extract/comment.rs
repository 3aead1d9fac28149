use crate::catalog::ReactionTable;
use crate::extract::path::Lookup;
use crate::extract::reactions::comment_reactions;
use crate::extract::shape::{first_match, PointerShape};
use crate::extract::types::{CommentBody, Extraction, ExtractedComment, Miss, ThreadMeta};
use crate::pagination::PageCursor;
use serde_json::Value;

/// One decoded page of a root comment or reply connection
#[derive(Debug, Clone, PartialEq)]
pub struct CommentPage {
    pub comments: Vec<ExtractedComment>,
    pub next: PageCursor,
    /// `total_count` of the connection (comments including replies)
    pub total_count: Option<u64>,
    /// `count` of the connection (root comments)
    pub root_count: Option<u64>,
}

/// Extracts a comment connection page
///
/// A connection without `page_info` is treated as the last page. Edges
/// whose node is missing are skipped; every other field of an edge
/// defaults independently.
pub fn extract_comment_page(
    document: &Value,
    shapes: &[PointerShape],
    reactions: &ReactionTable,
) -> Extraction<CommentPage> {
    let Some((shape, connection)) = first_match(shapes, document) else {
        tracing::debug!("Comment page matches no known connection shape");
        return Extraction::Empty(Miss::UnknownShape);
    };

    let connection = Lookup::new(connection);
    let comments: Vec<_> = connection
        .at("/edges")
        .array()
        .iter()
        .filter_map(|edge| extract_comment(edge, reactions))
        .collect();

    let next = connection
        .at("/page_info")
        .value()
        .and_then(PageCursor::from_page_info)
        .unwrap_or_else(PageCursor::end);

    tracing::debug!(
        shape,
        comments = comments.len(),
        has_next = next.has_next,
        "Extracted comment page"
    );

    Extraction::Record(CommentPage {
        comments,
        next,
        total_count: connection.at("/total_count").count(),
        root_count: connection.at("/count").count(),
    })
}

/// Extracts one comment edge; `None` when the edge carries no node
pub fn extract_comment(edge: &Value, reactions: &ReactionTable) -> Option<ExtractedComment> {
    let node = Lookup::new(edge).at("/node");
    if !node.exists() {
        return None;
    }

    let feedback = node.at("/feedback");
    let media_uri = node
        .at("/attachments")
        .last()
        .at("/style_type_renderer/attachment/media/image/uri")
        .string();

    Some(ExtractedComment {
        body: CommentBody {
            text: node.at("/body/text").text(),
            media: None,
            reactions: comment_reactions(feedback, reactions),
        },
        media_uri,
        thread: ThreadMeta {
            reply_count: feedback.at("/replies_fields/total_count").count_or_zero(),
            feedback_id: feedback.at("/id").string(),
            expansion_token: feedback.at("/expansion_info/expansion_token").string(),
        },
    })
}
