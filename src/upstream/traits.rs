//! Upstream traits and types

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Raw response from the upstream API
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if response is a plain 200 OK, the only cacheable status
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value, UpstreamError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Body as JSON, wrapping non-JSON text as `{"error": text}`
    pub fn json_lossy(&self) -> Value {
        self.json()
            .unwrap_or_else(|_| serde_json::json!({ "error": self.body }))
    }
}

/// Failure to obtain any response from the upstream API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("upstream returned malformed JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

// The request URL carries the API key; never let it reach logs or clients.
impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(e.without_url())
        }
    }
}

/// A remote video search service
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Run one search for `query`
    async fn search(&self, query: &str) -> Result<UpstreamResponse, UpstreamError>;
}
