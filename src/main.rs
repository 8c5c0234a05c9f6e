//! Tube Remote: cached video-search proxy and playback control channel
//!
//! This is the main entry point for the application.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tube_remote::{
    config,
    events::BroadcastHub,
    limiter::RateLimiter,
    upstream::YouTubeClient,
    web::{create_router, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Settings first so the log level can follow `general.debug`
    let settings_path = config::find_settings_file();
    let settings = config::load_from(settings_path.as_deref())?;

    init_logging(settings.general.debug);

    info!("Starting Tube Remote v{}", tube_remote::VERSION);
    match settings_path {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    if settings.upstream.api_key.is_empty() {
        warn!("YOUTUBE_API_KEY is not set; upstream searches will fail");
    }

    // Initialize upstream client
    let upstream = YouTubeClient::with_settings(&settings.upstream)?;
    info!("Upstream search endpoint: {}", upstream.base_url());

    // Create application state
    let state = AppState::new(settings.clone(), Arc::new(upstream));
    spawn_limiter_purge(state.limiter.clone(), longest_window(&settings));

    let app = create_router(state.clone());

    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );
    info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(state.hub.clone()))
    .await?;

    info!("Server stopped");
    Ok(())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn longest_window(settings: &config::Settings) -> Duration {
    let limits = &settings.limits;
    [limits.default, limits.search, limits.control]
        .iter()
        .map(|rule| rule.window())
        .max()
        .unwrap_or(Duration::from_secs(60))
}

/// Periodically drop limiter entries whose window has fully elapsed
fn spawn_limiter_purge(limiter: Arc<RateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.purge_expired();
        }
    });
}

/// Resolve on Ctrl-C, closing every viewer stream so the server can drain
async fn shutdown_signal(hub: BroadcastHub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Shutting down, closing {} viewer streams", hub.len());
    hub.close_all();
}
