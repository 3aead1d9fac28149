//! Transport layer
//!
//! This module defines the seam between the crawl engine and the remote API:
//! - [`Transport`]: executes one query request and returns status + raw body
//! - [`QueryRequest`]: identifier, resource key, cursor and extra variables
//! - [`RawResponse`]: undecoded response, split into JSON documents on demand
//! - [`HttpTransport`]: the reqwest-backed implementation

mod http;

pub use http::{build_http_client, HttpTransport};

use crate::TransportError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One request against the query endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Opaque identifier resolved from the query catalog
    pub query_id: String,

    /// Key of the resource being paginated (feed owner, post feedback, comment feedback)
    pub resource_key: String,

    /// Cursor variable name and value; `None` requests the first page
    pub cursor: Option<(String, String)>,

    /// Additional query variables
    pub variables: Map<String, Value>,
}

impl QueryRequest {
    pub fn new(query_id: impl Into<String>, resource_key: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            resource_key: resource_key.into(),
            cursor: None,
            variables: Map::new(),
        }
    }

    /// Sets the cursor variable
    pub fn with_cursor(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cursor = Some((name.into(), value.into()));
        self
    }

    /// Adds an extra variable
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Returns the cursor value, or an empty string for a first-page request
    pub fn cursor_value(&self) -> &str {
        self.cursor.as_ref().map(|(_, v)| v.as_str()).unwrap_or("")
    }

    /// Builds the full variable object sent to the endpoint
    pub fn to_variables(&self) -> Map<String, Value> {
        let mut vars = self.variables.clone();
        vars.insert("id".to_string(), Value::String(self.resource_key.clone()));
        if let Some((name, value)) = &self.cursor {
            vars.insert(name.clone(), Value::String(value.clone()));
        }
        vars
    }
}

/// Raw response as returned by the transport
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Option<Vec<u8>>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: Some(body.into()),
        }
    }

    /// Decodes the body into its JSON documents
    ///
    /// Bodies routinely hold several documents separated by newlines. Decoding
    /// stops at the first malformed document; documents before it are kept.
    pub fn documents(&self) -> Vec<Value> {
        let Some(body) = &self.body else {
            return Vec::new();
        };

        let mut documents = Vec::new();
        for item in serde_json::Deserializer::from_slice(body).into_iter::<Value>() {
            match item {
                Ok(value) => documents.push(value),
                Err(e) => {
                    tracing::warn!(
                        "Malformed JSON document after {} decoded documents: {}",
                        documents.len(),
                        e
                    );
                    break;
                }
            }
        }
        documents
    }
}

/// Executes query requests against the remote API
///
/// Implementations report a non-2xx status or a network failure as a
/// [`TransportError`]; the caller decides whether to retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &QueryRequest) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn execute(&self, request: &QueryRequest) -> Result<RawResponse, TransportError> {
        (**self).execute(request).await
    }
}
