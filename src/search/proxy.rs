//! Cache-aside search gate

use crate::cache::SearchCache;
use crate::error::ApiError;
use crate::limiter::{Decision, RateLimiter, RouteClass};
use crate::metrics::Metrics;
use crate::upstream::VideoSearch;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Search gate composing the limiter, the cache and the upstream API
pub struct SearchProxy {
    cache: SearchCache,
    upstream: Arc<dyn VideoSearch>,
    limiter: Arc<RateLimiter>,
    metrics: Arc<Metrics>,
}

impl SearchProxy {
    pub fn new(
        cache: SearchCache,
        upstream: Arc<dyn VideoSearch>,
        limiter: Arc<RateLimiter>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            cache,
            upstream,
            limiter,
            metrics,
        }
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Run one search request for the client `identity`.
    ///
    /// Steps, each short-circuiting: reject a missing or empty query,
    /// apply the search rate limit, answer from cache, otherwise fetch
    /// upstream. Only 200 OK upstream responses are cached; any other
    /// status is passed through with its body.
    pub async fn search(&self, identity: &str, query: Option<&str>) -> Result<Arc<Value>, ApiError> {
        let query = match query {
            Some(q) if !q.is_empty() => q,
            _ => return Err(ApiError::MissingQuery),
        };

        if let Decision::Limited { retry_after } = self.limiter.check(identity, RouteClass::Search) {
            self.metrics.record_rate_limited();
            warn!("Search rate limit exceeded for {}", identity);
            return Err(ApiError::RateLimited { retry_after });
        }

        self.metrics.inc_search();

        if let Some(hit) = self.cache.get(query).await {
            self.metrics.record_cache_hit();
            debug!("Cache hit for {:?}", query);
            return Ok(hit);
        }
        self.metrics.record_cache_miss();
        debug!("Cache miss for {:?}", query);

        let response = self.upstream.search(query).await.map_err(|e| {
            self.metrics.record_upstream_error();
            warn!("Upstream search for {:?} failed: {}", query, e);
            e
        })?;

        if !response.is_ok() {
            if !(200..300).contains(&response.status) {
                self.metrics.record_upstream_error();
            }
            warn!(
                "Upstream search for {:?} returned status {}",
                query, response.status
            );
            return Err(ApiError::UpstreamStatus {
                status: response.status,
                body: response.json_lossy(),
            });
        }

        let value = Arc::new(response.json().map_err(|e| {
            self.metrics.record_upstream_error();
            warn!("Upstream search for {:?} returned malformed body: {}", query, e);
            e
        })?);

        self.cache.set(query.to_string(), value.clone()).await;
        Ok(value)
    }
}
