//! HTTP request handlers

use super::client_ip::ClientIdentity;
use super::state::AppState;
use crate::error::ApiError;
use crate::events::{frame_stream, ControlCommand, EventType, Frame};
use crate::limiter::{Decision, RouteClass};
use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderName},
    middleware::Next,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

/// Query parameters for the search proxy
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search text, forwarded verbatim
    pub query: Option<String>,
}

/// Acknowledgement returned by the control endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    pub message: String,
}

/// Search proxy handler
pub async fn search_video(
    State(state): State<AppState>,
    identity: ClientIdentity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Arc<Value>>, ApiError> {
    let result = state
        .search
        .search(identity.as_str(), params.query.as_deref())
        .await?;
    Ok(Json(result))
}

/// Viewer event stream handler
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.hub.register();

    let stream = frame_stream(subscription, state.keep_alive()).map(|frame| {
        let event = match frame {
            Frame::Message(payload) => Event::default().data(&*payload),
            Frame::KeepAlive => Event::default().comment(""),
        };
        Ok::<_, Infallible>(event)
    });

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(stream),
    )
}

pub async fn play(
    State(state): State<AppState>,
    identity: ClientIdentity,
) -> Result<Json<ControlResponse>, ApiError> {
    send_command(&state, &identity, ControlCommand::Play)
}

pub async fn pause(
    State(state): State<AppState>,
    identity: ClientIdentity,
) -> Result<Json<ControlResponse>, ApiError> {
    send_command(&state, &identity, ControlCommand::Pause)
}

pub async fn toggle(
    State(state): State<AppState>,
    identity: ClientIdentity,
) -> Result<Json<ControlResponse>, ApiError> {
    send_command(&state, &identity, ControlCommand::Toggle)
}

fn send_command(
    state: &AppState,
    identity: &ClientIdentity,
    command: ControlCommand,
) -> Result<Json<ControlResponse>, ApiError> {
    enforce_limit(state, identity, RouteClass::Control)?;

    let report = state.hub.publish(EventType::Control, command);
    state.metrics.record_publish(report.delivered, report.dropped);
    info!(
        "{} command from {} sent to {} viewers",
        command, identity.as_str(), report.delivered
    );

    Ok(Json(ControlResponse {
        status: "success".to_string(),
        message: format!("{} command sent", command.title()),
    }))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "counters": state.metrics.snapshot(),
        "viewers": state.hub.len(),
        "cached_queries": state.search.cache().size(),
        "tracked_clients": state.limiter.tracked(),
    }))
}

/// Middleware applying the default limit to routes without an override
pub async fn default_limit(
    State(state): State<AppState>,
    identity: ClientIdentity,
    request: Request,
    next: Next,
) -> Response {
    match enforce_limit(&state, &identity, RouteClass::Default) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

fn enforce_limit(state: &AppState, identity: &ClientIdentity, class: RouteClass) -> Result<(), ApiError> {
    match state.limiter.check(identity.as_str(), class) {
        Decision::Allowed => Ok(()),
        Decision::Limited { retry_after } => {
            state.metrics.record_rate_limited();
            warn!("Rate limit ({}) exceeded for {}", class, identity.as_str());
            Err(ApiError::RateLimited { retry_after })
        }
    }
}
