use serde_json::Value;

/// Pagination position for one resource stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// Opaque API-supplied token; empty for the first page
    pub cursor: String,

    /// Whether the API reported another page after this position
    pub has_next: bool,
}

impl PageCursor {
    /// Initial state of every stream
    pub fn initial() -> Self {
        Self {
            cursor: String::new(),
            has_next: true,
        }
    }

    /// A terminal cursor
    pub fn end() -> Self {
        Self {
            cursor: String::new(),
            has_next: false,
        }
    }

    pub fn next(cursor: impl Into<String>) -> Self {
        Self {
            cursor: cursor.into(),
            has_next: true,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.has_next && self.cursor.is_empty()
    }

    /// Reads a `page_info` object (`has_next_page` + `end_cursor`)
    ///
    /// Returns `None` when `has_next_page` is absent, or when another page is
    /// announced without a cursor to reach it.
    pub fn from_page_info(page_info: &Value) -> Option<Self> {
        let has_next = page_info.get("has_next_page")?.as_bool()?;
        let cursor = page_info
            .get("end_cursor")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if has_next && cursor.is_empty() {
            return None;
        }

        Some(Self { cursor, has_next })
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::initial()
    }
}
