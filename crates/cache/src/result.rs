//! In-process TTL cache for rendered query results, backed by DashMap for
//! lock-free concurrent access from request handlers.

use dashmap::DashMap;
use shelfwise_core::config::CacheConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Successful responses keyed by operation and arguments. Entries older
/// than the TTL are treated as missing.
pub struct ResultCache<V> {
    store: Arc<DashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
    enabled: bool,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl,
            max_entries,
            enabled: true,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let mut cache = Self::new(Duration::from_secs(config.ttl_secs), config.max_entries);
        cache.enabled = config.enabled;
        cache
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }
        let Some(entry) = self.store.get(key) else {
            metrics::counter!("cache.miss").increment(1);
            return None;
        };
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.store.remove(key);
            metrics::counter!("cache.miss").increment(1);
            return None;
        }
        metrics::counter!("cache.hit").increment(1);
        Some(entry.value.clone())
    }

    pub fn put(&self, key: String, value: V) {
        if !self.enabled {
            return;
        }
        // Over capacity: skip new keys until the maintenance task evicts.
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            metrics::counter!("cache.skipped_full").increment(1);
            return;
        }
        self.store.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove expired entries. Call this periodically from a background task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        let evicted = before.saturating_sub(self.store.len());
        if evicted > 0 {
            debug!(evicted, "Evicted expired cache entries");
        }
        evicted
    }

    /// Drop everything, e.g. after the engine snapshot changes.
    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_put_then_get() {
        let cache = ResultCache::new(Duration::from_secs(60), 10);
        cache.put("a".to_string(), vec![1, 2, 3]);
        assert_eq!(cache.get("a"), Some(vec![1, 2, 3]));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = ResultCache::new(Duration::from_millis(1), 10);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.evict_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_full_cache_skips_new_keys_only() {
        let cache = ResultCache::new(Duration::from_secs(60), 2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        cache.put("c".to_string(), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c"), None);

        cache.put("a".to_string(), 10);
        assert_eq!(cache.get("a"), Some(10));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let cache = ResultCache::from_config(&config);
        cache.put("a".to_string(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_clear() {
        let cache = ResultCache::new(Duration::from_secs(60), 10);
        cache.put("a".to_string(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
