//! Tube Remote: a cached video-search proxy and a live playback control
//! channel for remote viewers.
//!
//! Searches go through a per-client rate limiter and a one-week result
//! cache before reaching the upstream API. Playback commands posted to the
//! control endpoints are pushed to every viewer connected to `/events`.

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod limiter;
pub mod metrics;
pub mod search;
pub mod upstream;
pub mod web;

pub use config::Settings;
pub use error::ApiError;
pub use events::BroadcastHub;
pub use limiter::{RateLimiter, RouteClass};
pub use search::SearchProxy;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
