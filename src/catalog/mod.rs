//! Persisted lookup tables loaded once before a run
//!
//! - [`QueryCatalog`] maps query names to the opaque identifiers the
//!   transport needs to address a query.
//! - [`ReactionTable`] maps numeric reaction identifiers to reaction names.
//!
//! Both are read once at startup and then shared by reference; nothing
//! re-reads them mid-run.

mod reactions;

pub use reactions::ReactionTable;

use crate::{CatalogError, CatalogResult};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Query used for every feed page
pub const FEED_QUERY: &str = "ProfileCometTimelineFeedRefetchQuery";

/// Query used for the first page of a post's root comments
pub const ROOT_COMMENTS_QUERY: &str = "CommentListComponentsRootQuery";

/// Query used for subsequent pages of a post's root comments
pub const MORE_COMMENTS_QUERY: &str = "CommentsListComponentsPaginationQuery";

/// Query used for every page of a root comment's replies
pub const REPLIES_QUERY: &str = "Depth1CommentsListPaginationQuery";

/// Immutable name → identifier mapping
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    entries: HashMap<String, String>,
}

impl QueryCatalog {
    /// Loads the catalog from a JSON object file
    ///
    /// Identifiers may be stored either as strings or as integers.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let raw: HashMap<String, Value> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (name, value) in raw {
            let id = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return Err(CatalogError::InvalidEntry { name }),
            };
            entries.insert(name, id);
        }

        tracing::debug!("Loaded {} catalog entries from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    /// Builds a catalog from already known pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Resolves a query name to its identifier
    ///
    /// A missing name is fatal for the query type that needs it.
    pub fn lookup(&self, name: &str) -> CatalogResult<&str> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| CatalogError::Missing(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
