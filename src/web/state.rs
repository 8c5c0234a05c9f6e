//! Application state shared across handlers

use crate::cache::SearchCache;
use crate::config::Settings;
use crate::events::BroadcastHub;
use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use crate::search::SearchProxy;
use crate::upstream::VideoSearch;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search gate
    pub search: Arc<SearchProxy>,
    /// Per-client limiter shared by every route
    pub limiter: Arc<RateLimiter>,
    /// Connected viewers
    pub hub: BroadcastHub,
    /// Counters
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state; every registry starts empty
    pub fn new(settings: Settings, upstream: Arc<dyn VideoSearch>) -> Self {
        let limiter = Arc::new(RateLimiter::new(settings.limits.clone()));
        let metrics = Arc::new(Metrics::new());
        let search = Arc::new(SearchProxy::new(
            SearchCache::with_settings(&settings.cache),
            upstream,
            limiter.clone(),
            metrics.clone(),
        ));
        let hub = BroadcastHub::new(settings.events.channel_capacity);

        Self {
            settings: Arc::new(settings),
            search,
            limiter,
            hub,
            metrics,
        }
    }

    /// Idle time before a viewer gets a keep-alive frame
    pub fn keep_alive(&self) -> Duration {
        self.settings.events.keep_alive()
    }
}
