use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Total reaction count plus per-reaction-name breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub total: Option<u64>,
    pub detail: BTreeMap<String, u64>,
}

/// Content shared by root comments and replies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentBody {
    pub text: String,
    pub media: Option<String>,
    pub reactions: ReactionSummary,
}

/// A reply to a root comment; replies never carry replies of their own
pub type Reply = CommentBody;

/// A root comment with its direct replies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(flatten)]
    pub body: CommentBody,
    pub replies: Vec<Reply>,
}

/// A post's root comments and the counts reported alongside them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    /// Comments including replies, as reported by the API
    pub total_count: Option<u64>,
    /// Root comments, as reported by the API
    pub root_count: Option<u64>,
    pub comments: Vec<Comment>,
}

/// Canonical post record; complete once its comment thread is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable idempotency key (see [`record_key`])
    pub record_key: String,
    pub content: String,
    pub media: Vec<String>,
    pub reactions: ReactionSummary,
    pub share_count: Option<String>,
    pub comment_count: u64,
    pub url: String,
    pub feedback_id: Option<String>,
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<CommentThread>,
}

/// Data needed to fetch a root comment's replies; consumed once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadMeta {
    pub reply_count: u64,
    pub feedback_id: Option<String>,
    pub expansion_token: Option<String>,
}

impl ThreadMeta {
    /// Feedback identifier and expansion token, when a reply fetch is warranted
    pub fn reply_stream(&self) -> Option<(&str, &str)> {
        if self.reply_count == 0 {
            return None;
        }
        Some((self.feedback_id.as_deref()?, self.expansion_token.as_deref()?))
    }
}

/// Post as produced by extraction, before media is materialized
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPost {
    pub post: Post,
    pub media_uris: Vec<String>,
}

/// Comment as produced by extraction, before media and replies are attached
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedComment {
    pub body: CommentBody,
    pub media_uri: Option<String>,
    pub thread: ThreadMeta,
}

/// Why a document produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// The envelope matched none of the known shapes
    UnknownShape,
    /// The envelope matched but carried no post URL
    MissingUrl,
}

/// Outcome of extracting one document: a record or an empty record
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Record(T),
    Empty(Miss),
}

impl<T> Extraction<T> {
    pub fn into_record(self) -> Option<T> {
        match self {
            Self::Record(record) => Some(record),
            Self::Empty(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

/// SHA-256 (hex) of the post's feedback identifier, or of its URL when the
/// identifier is absent
pub fn record_key(feedback_id: Option<&str>, url: &str) -> String {
    let mut hasher = Sha256::new();
    match feedback_id {
        Some(id) => {
            hasher.update(b"feedback:");
            hasher.update(id.as_bytes());
        }
        None => {
            hasher.update(b"url:");
            hasher.update(url.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}
