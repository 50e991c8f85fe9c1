//! TTL + LRU bounded response cache (C3), keyed by (domain, topic, location, days).
//!
//! Backed by `moka`'s async cache, the same caching primitive the teacher
//! uses for its per-domain article/thread/group caches — `moka` already
//! implements TTL expiry and bounded-size eviction with an LRU-ish policy,
//! so this wrapper only adds the stable key hashing and the metrics hooks.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::handler::ArticlesResponse;
use crate::metrics::Metrics;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub domain: String,
    pub topic: Option<String>,
    pub location: Option<String>,
    pub last_n_days: u32,
    pub count: usize,
}

impl CacheKey {
    fn stable_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

pub struct ResponseCache {
    inner: Cache<u64, ArticlesResponse>,
    metrics: Arc<Metrics>,
}

impl ResponseCache {
    pub fn new(ttl_secs: u64, max_entries: u64, metrics: Arc<Metrics>) -> Self {
        let inner = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .max_capacity(max_entries)
            .build();
        Self { inner, metrics }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<ArticlesResponse> {
        let hit = self.inner.get(&key.stable_hash()).await;
        if hit.is_some() {
            self.metrics.incr("cache_hit");
        } else {
            self.metrics.incr("cache_miss");
        }
        hit
    }

    pub async fn set(&self, key: &CacheKey, value: ArticlesResponse) {
        self.inner.insert(key.stable_hash(), value).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> ArticlesResponse {
        ArticlesResponse {
            articles: vec![],
            source_used: "official_feed".to_string(),
            cached: false,
            duration_ms: 0,
            message: None,
        }
    }

    #[tokio::test]
    async fn hit_after_set() {
        let cache = ResponseCache::new(300, 1000, Arc::new(Metrics::new()));
        let key = CacheKey {
            domain: "techcrunch.com".to_string(),
            topic: None,
            location: None,
            last_n_days: 10,
            count: 8,
        };
        assert!(cache.get(&key).await.is_none());
        cache.set(&key, sample_response()).await;
        assert!(cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_collide() {
        let cache = ResponseCache::new(300, 1000, Arc::new(Metrics::new()));
        let key_a = CacheKey {
            domain: "techcrunch.com".to_string(),
            topic: Some("ai".to_string()),
            location: None,
            last_n_days: 10,
            count: 8,
        };
        let key_b = CacheKey {
            domain: "techcrunch.com".to_string(),
            topic: Some("crypto".to_string()),
            location: None,
            last_n_days: 10,
            count: 8,
        };
        cache.set(&key_a, sample_response()).await;
        assert!(cache.get(&key_a).await.is_some());
        assert!(cache.get(&key_b).await.is_none());
    }
}
