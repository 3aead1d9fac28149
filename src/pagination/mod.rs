//! Cursor-based pagination with a bounded retry budget
//!
//! Every stream (the feed, one post's root comments, one comment's replies)
//! starts at [`PageCursor::initial`] and stops when the API reports no further
//! page, when the caller's record target is reached, or when `max_retry`
//! consecutive fetches fail. Abandoning a stream is never an error: the caller
//! keeps whatever the stream produced.

mod cursor;
mod retry;
mod stream;

pub use cursor::PageCursor;
pub use retry::{RetryCounter, RetryPolicy};
pub use stream::{collect_stream, Page, PageSource, PageStream, StreamOutcome, Termination};

use crate::TransportError;
use thiserror::Error;

/// Failure of one page fetch; always retried within the stream's budget
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("page could not be extracted: {0}")]
    Extraction(String),

    #[error("API returned the requested cursor '{0}' again")]
    StalledCursor(String),
}
