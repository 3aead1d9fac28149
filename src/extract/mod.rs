//! Tolerant extraction of posts, comments and replies
//!
//! This module turns loosely-shaped response documents into canonical records:
//! - Envelope shape detection with ordered matchers
//! - Independent, defaulted field access
//! - Reaction summaries resolved through the reaction table
//!
//! Extraction is pure. Media materialization and reply fetching happen later
//! in the engine, driven by the URIs and thread metadata returned here.

mod comment;
pub mod path;
mod post;
mod reactions;
pub mod shape;
mod types;

pub use comment::{extract_comment, extract_comment_page, CommentPage};
pub use path::Lookup;
pub use post::{attachment_image_uris, clean_content, extract_post, feed_page_cursor};
pub use reactions::{comment_reactions, post_reactions};
pub use types::{
    record_key, Comment, CommentBody, CommentThread, ExtractedComment, ExtractedPost, Extraction,
    Miss, Post, ReactionSummary, Reply, ThreadMeta,
};
