//! TTL-bounded memoization of extracted links
//!
//! The crawler revisits URLs through multiple discovery paths; within the
//! TTL window the extracted-link list is served from this cache instead of
//! re-fetching the page. Capacity is bounded with LRU eviction so a large
//! site cannot grow the memo without limit.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::utils::constants::LINK_CACHE_CAPACITY;

struct CachedLinks {
    links: Vec<String>,
    stored_at: Instant,
}

/// Bounded TTL cache keyed by normalized URL.
pub struct LinkCache {
    entries: Mutex<LruCache<String, CachedLinks>>,
    ttl: Duration,
}

impl LinkCache {
    /// Create a cache with the given TTL and the default capacity bound.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, LINK_CACHE_CAPACITY)
    }

    /// Create a cache with an explicit capacity bound.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("cache capacity must be non-zero");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Fetch the memoized link list for a normalized URL.
    ///
    /// Expired entries are evicted on access and reported as a miss.
    pub async fn get(&self, normalized_url: &str) -> Option<Vec<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(normalized_url) {
            Some(cached) if cached.stored_at.elapsed() < self.ttl => Some(cached.links.clone()),
            Some(_) => {
                entries.pop(normalized_url);
                None
            }
            None => None,
        }
    }

    /// Memoize the extracted links for a normalized URL.
    pub async fn put(&self, normalized_url: String, links: Vec<String>) {
        let mut entries = self.entries.lock().await;
        entries.put(
            normalized_url,
            CachedLinks {
                links,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of live entries (expired entries may still be counted until
    /// their next access).
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn caches_within_ttl() {
        let cache = LinkCache::new(Duration::from_secs(60));
        cache
            .put(
                "https://example.com".to_string(),
                vec!["https://example.com/a".to_string()],
            )
            .await;

        let hit = cache.get("https://example.com").await;
        assert_eq!(hit, Some(vec!["https://example.com/a".to_string()]));
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = LinkCache::new(Duration::from_millis(10));
        cache.put("https://example.com".to_string(), vec![]).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("https://example.com").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn capacity_is_bounded() {
        let cache = LinkCache::with_capacity(Duration::from_secs(60), 2);
        for i in 0..5 {
            cache.put(format!("https://example.com/{i}"), vec![]).await;
        }
        assert_eq!(cache.len().await, 2);
    }
}
