//! Caching module for Tube Remote
//!
//! Keeps upstream search responses keyed by the verbatim query string.
//! Entries expire a fixed time after insertion; an expired entry reads as
//! absent and is replaced by the next successful fetch.

use crate::config::CacheSettings;
use moka::future::Cache;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Cache for upstream search results
#[derive(Clone)]
pub struct SearchCache {
    cache: Cache<String, Arc<Value>>,
}

impl SearchCache {
    /// Create a new result cache with the given TTL
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();

        Self { cache }
    }

    pub fn with_settings(settings: &CacheSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.ttl_seconds),
            settings.max_capacity,
        )
    }

    /// Get a cached result, `None` once it has expired
    pub async fn get(&self, query: &str) -> Option<Arc<Value>> {
        self.cache.get(query).await
    }

    /// Store a result, replacing any previous entry for the query
    pub async fn set(&self, query: String, value: impl Into<Arc<Value>>) {
        self.cache.insert(query, value.into()).await;
    }

    /// Approximate number of cached queries
    pub fn size(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::with_settings(&CacheSettings::default())
    }
}
