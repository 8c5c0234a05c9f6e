//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.settings.server.static_dir.clone();
    let index = static_dir.join(&state.settings.server.index_file);

    // Routes carrying their own limit class, or none
    let api = Router::new()
        .route("/search_video", get(handlers::search_video))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/toggle", post(handlers::toggle))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats));

    // Routes under the default limit
    let limited = Router::new()
        .route("/events", get(handlers::events))
        .route_service("/", ServeFile::new(index))
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::default_limit,
        ));

    api.merge(limited)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}
