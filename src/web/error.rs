//! HTTP rendering of request errors

use crate::error::ApiError;
use crate::upstream::UpstreamError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            Self::MissingQuery => error_response(StatusCode::BAD_REQUEST, message),
            Self::RateLimited { retry_after } => (
                [(header::RETRY_AFTER, retry_after_secs(retry_after).to_string())],
                error_response(StatusCode::TOO_MANY_REQUESTS, message),
            )
                .into_response(),
            Self::UpstreamStatus { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(body)).into_response()
            }
            Self::Upstream(UpstreamError::Timeout) => {
                error_response(StatusCode::GATEWAY_TIMEOUT, message)
            }
            Self::Upstream(_) => error_response(StatusCode::BAD_GATEWAY, message),
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Whole seconds, rounded up, never zero
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}
