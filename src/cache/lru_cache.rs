//! LRU Cache Module
//!
//! Bounded recency cache with per-entry expiration, combining a `HashMap`
//! for O(1) lookup with a `RecencyList` for O(1) promotion and eviction.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use tracing::debug;

use crate::cache::{CacheStats, RecencyList};
use crate::entry::{Entry, Expiry};

// == LRU Cache ==
/// Capacity-bounded cache evicting the least recently used entry.
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// Key to recency slot
    map: HashMap<K, usize>,
    /// Entries ordered from most to least recently used
    order: RecencyList<(K, Entry<V>)>,
    /// Maximum number of entries held at once
    capacity: usize,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of zero disables caching: `put` becomes a no-op.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: RecencyList::with_capacity(capacity),
            capacity,
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Returns the live value for `key` and marks it most recently used.
    ///
    /// An expired entry is evicted on the spot and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let Some(&idx) = self.map.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if self.order.get(idx).1.is_expired() {
            self.order.remove(idx);
            self.map.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!("cache entry expired on read");
            return None;
        }

        self.order.touch(idx);
        self.stats.record_hit();
        Some(self.order.get(idx).1.value.clone())
    }

    // == Put ==
    /// Stores `value` under `key` and marks it most recently used.
    ///
    /// An existing key has its value and expiry replaced. A new key arriving
    /// at capacity first evicts the least recently used entry, whether or not
    /// that entry has expired.
    pub fn put(&mut self, key: K, value: V, expiry: impl Into<Expiry>) {
        let entry = Entry::new(value, expiry.into());

        if let Some(&idx) = self.map.get(&key) {
            self.order.get_mut(idx).1 = entry;
            self.order.touch(idx);
            return;
        }

        if self.capacity == 0 {
            return;
        }

        if self.map.len() >= self.capacity {
            if let Some((evicted, _)) = self.order.pop_back() {
                self.map.remove(&evicted);
                self.stats.record_eviction();
                debug!("cache full at {} entries, evicted least recently used", self.capacity);
            }
        }

        let idx = self.order.push_front((key.clone(), entry));
        self.map.insert(key, idx);
        self.stats.set_entries(self.map.len());
    }

    // == Remove ==
    /// Drops `key` if present. Returns whether anything was removed.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.map.remove(key) {
            Some(idx) => {
                self.order.remove(idx);
                self.stats.set_entries(self.map.len());
                true
            }
            None => false,
        }
    }

    // == Sweep Expired ==
    /// Removes every expired entry and returns how many were dropped.
    ///
    /// Recency and expiration are unrelated orders, so the whole cache is
    /// scanned rather than stopping at the first live entry from the back.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<usize> = self
            .order
            .iter()
            .filter(|(_, (_, entry))| entry.expiry.is_expired_at(now))
            .map(|(idx, _)| idx)
            .collect();

        for &idx in &expired {
            let (key, _) = self.order.remove(idx);
            self.map.remove(&key);
        }

        self.stats.record_expirations(expired.len());
        self.stats.set_entries(self.map.len());
        expired.len()
    }

    // == Inspection ==
    /// Whether `key` is held, expired or not. Does not affect recency.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Expiry of `key` without touching recency.
    pub fn peek_expiry(&self, key: &K) -> Option<Expiry> {
        self.map.get(key).map(|&idx| self.order.get(idx).1.expiry)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.order.iter().map(|(_, (key, _))| key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_entries(self.map.len());
        stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Ttl;
    use std::thread::sleep;
    use std::time::Duration;

    fn cache_of(keys: &[i32]) -> LruCache<i32, String> {
        let mut cache = LruCache::new(3);
        for &k in keys {
            cache.put(k, format!("value{}", k), Ttl::Permanent);
        }
        cache
    }

    #[test]
    fn test_cache_new() {
        let cache: LruCache<i32, String> = LruCache::new(3);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = cache_of(&[1]);

        assert_eq!(cache.get(&1), Some("value1".to_string()));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = cache_of(&[1, 2, 3]);

        cache.put(4, "value4".to_string(), Ttl::Permanent);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&4), Some("value4".to_string()));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_promotes_entry() {
        let mut cache = cache_of(&[1, 2, 3]);

        cache.get(&2);
        cache.put(4, "value4".to_string(), Ttl::Permanent);

        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert_eq!(cache.keys(), vec![4, 2, 3]);
    }

    #[test]
    fn test_put_existing_updates_and_promotes() {
        let mut cache = cache_of(&[1, 2, 3]);

        cache.put(1, "updated".to_string(), Ttl::seconds(60));
        cache.put(4, "value4".to_string(), Ttl::Permanent);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&1), Some("updated".to_string()));
        assert!(!cache.contains(&2));
        assert!(!cache.peek_expiry(&1).unwrap().is_permanent());
    }

    #[test]
    fn test_eviction_ignores_expiry_of_victim() {
        let mut cache = LruCache::new(2);
        cache.put(1, "old", Ttl::Permanent);
        cache.put(2, "soon", Ttl::seconds(1));
        cache.get(&1);

        cache.put(3, "new", Ttl::Permanent);

        // 2 was least recently used, so it goes even though 1 is older.
        assert_eq!(cache.keys(), vec![3, 1]);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let mut cache = LruCache::new(3);
        cache.put("k1", 1, Ttl::seconds(1));
        cache.put("k2", 2, Ttl::Permanent);

        sleep(Duration::from_millis(1100));

        assert_eq!(cache.get(&"k1"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"k2"), Some(2));

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_remove() {
        let mut cache = cache_of(&[1, 2]);

        assert!(cache.remove(&1));
        assert!(!cache.remove(&1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys(), vec![2]);
    }

    #[test]
    fn test_sweep_finds_expired_behind_live_entries() {
        let mut cache = LruCache::new(4);
        let now = Instant::now();
        // Least recently used entry is live; expired ones sit in front of it.
        cache.put(1, "live", Expiry::Never);
        cache.put(2, "dead", Expiry::At(now));
        cache.put(3, "live", Expiry::Never);
        cache.put(4, "dead", Expiry::At(now));

        let removed = cache.sweep_expired();

        assert_eq!(removed, 2);
        assert_eq!(cache.keys(), vec![3, 1]);
        assert_eq!(cache.stats().expirations, 2);
        assert_eq!(cache.sweep_expired(), 0);
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let mut cache = LruCache::new(0);
        cache.put(1, 1, Ttl::Permanent);

        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
    }
}
