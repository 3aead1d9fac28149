//! Durable output for completed posts
//!
//! A post reaches the sink only once its comment thread is attached. Each
//! append is flushed before returning, so an interrupted run keeps every post
//! persisted so far.

mod jsonl;

pub use jsonl::JsonlSink;

use crate::extract::Post;
use crate::SinkError;
use std::path::Path;

/// What an append did with the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Written,
    /// A record with the same key is already present at the destination
    Duplicate,
}

/// Trait for post writers
pub trait Sink: Send {
    /// Appends one completed post to the destination at `path`
    ///
    /// The record must be durable once this returns `Ok`.
    fn append(&mut self, path: &Path, post: &Post) -> Result<AppendOutcome, SinkError>;

    /// Returns true when a record with `key` is already present at `path`
    fn contains(&mut self, _path: &Path, _key: &str) -> Result<bool, SinkError> {
        Ok(false)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn append(&mut self, path: &Path, post: &Post) -> Result<AppendOutcome, SinkError> {
        (**self).append(path, post)
    }

    fn contains(&mut self, path: &Path, key: &str) -> Result<bool, SinkError> {
        (**self).contains(path, key)
    }
}
