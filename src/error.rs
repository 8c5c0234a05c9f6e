//! Request-scoped errors
//!
//! None of these are fatal to the process; each ends a single request.

use crate::upstream::UpstreamError;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Required `query` parameter absent or empty
    #[error("Missing query parameter")]
    MissingQuery,
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Duration },
    /// Upstream answered with a non-success status; passed through as-is
    #[error("Upstream returned status {status}")]
    UpstreamStatus { status: u16, body: Value },
    /// No usable upstream response at all
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
