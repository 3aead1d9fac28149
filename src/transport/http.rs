//! HTTP transport implementation
//!
//! Requests are sent as form-encoded POSTs carrying two fields:
//! `variables` (the JSON-encoded variable object) and `doc_id` (the query
//! identifier). Session headers from the configuration are attached to
//! every request.

use crate::config::TransportConfig;
use crate::transport::{QueryRequest, RawResponse, Transport};
use crate::TransportError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Builds an HTTP client with the configured user agent, timeout and
/// session headers
///
/// # Arguments
///
/// * `config` - The transport configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(TransportError)` - A header could not be encoded or the client failed to build
pub fn build_http_client(config: &TransportConfig) -> Result<Client, TransportError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Encode(format!("header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::Encode(format!("header value for '{}': {}", name.as_str(), e)))?;
        headers.insert(name, value);
    }

    Ok(Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?)
}

/// reqwest-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client(config)?,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Returns the underlying client, shared with the media store
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &QueryRequest) -> Result<RawResponse, TransportError> {
        let variables = serde_json::to_string(&request.to_variables())
            .map_err(|e| TransportError::Encode(e.to_string()))?;

        tracing::trace!(
            query_id = %request.query_id,
            resource = %request.resource_key,
            cursor = %request.cursor_value(),
            "Sending query"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("variables", variables.as_str()),
                ("doc_id", request.query_id.as_str()),
            ])
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify_error)?;
        if body.is_empty() {
            return Err(TransportError::EmptyBody);
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body: Some(body.to_vec()),
        })
    }
}

/// Maps a reqwest failure to a transport error with a readable message
fn classify_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Network("Request timeout".to_string())
    } else if e.is_connect() {
        TransportError::Network("Connection refused".to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}
