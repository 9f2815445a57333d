//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the recency cache against a simple ordered model.

use proptest::prelude::*;
use std::collections::HashSet;
use std::thread::sleep;
use std::time::Duration;

use crate::cache::LruCache;
use crate::entry::Ttl;

// == Test Configuration ==
const TEST_CAPACITY: usize = 8;

// == Strategies ==
/// Keys from a small space so that hits, updates and evictions all happen.
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..24
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,12}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: String },
    Get { key: u8 },
    Remove { key: u8 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

/// Reference model: a vector ordered from most to least recently used.
#[derive(Default)]
struct Model {
    order: Vec<(u8, String)>,
}

impl Model {
    fn position(&self, key: u8) -> Option<usize> {
        self.order.iter().position(|(k, _)| *k == key)
    }

    fn get(&mut self, key: u8) -> Option<String> {
        let pos = self.position(key)?;
        let item = self.order.remove(pos);
        let value = item.1.clone();
        self.order.insert(0, item);
        Some(value)
    }

    fn put(&mut self, key: u8, value: String, capacity: usize) {
        if let Some(pos) = self.position(key) {
            self.order.remove(pos);
        } else if self.order.len() >= capacity {
            self.order.pop();
        }
        self.order.insert(0, (key, value));
    }

    fn remove(&mut self, key: u8) {
        if let Some(pos) = self.position(key) {
            self.order.remove(pos);
        }
    }

    fn keys(&self) -> Vec<u8> {
        self.order.iter().map(|(k, _)| *k).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of operations, lookups, recency order and size match
    // the reference model, and the size never exceeds capacity.
    #[test]
    fn prop_matches_recency_model(ops in prop::collection::vec(cache_op_strategy(), 1..200)) {
        let mut cache = LruCache::new(TEST_CAPACITY);
        let mut model = Model::default();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    cache.put(key, value.clone(), Ttl::Permanent);
                    model.put(key, value, TEST_CAPACITY);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key), model.get(key));
                }
                CacheOp::Remove { key } => {
                    cache.remove(&key);
                    model.remove(key);
                }
            }
            prop_assert!(cache.len() <= TEST_CAPACITY, "size {} over capacity", cache.len());
            prop_assert_eq!(cache.keys(), model.keys());
        }
    }

    // *For any* fill past capacity, the first key inserted and never touched
    // again is the one evicted.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(key_strategy(), 3..10),
        new_key in key_strategy(),
    ) {
        let unique_keys: Vec<u8> = {
            let mut seen = HashSet::new();
            initial_keys.into_iter().filter(|k| seen.insert(*k)).collect()
        };
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = LruCache::new(capacity);
        for key in &unique_keys {
            cache.put(*key, format!("value_{}", key), Ttl::Permanent);
        }

        cache.put(new_key, "new".to_string(), Ttl::Permanent);

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.contains(&unique_keys[0]));
        prop_assert!(cache.contains(&new_key));
        for key in unique_keys.iter().skip(1) {
            prop_assert!(cache.contains(key), "key {} should survive", key);
        }
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(3))]

    // *For any* mix of short and permanent TTLs, a sweep after the short TTL
    // elapses removes exactly the short-lived entries.
    #[test]
    fn prop_sweep_removes_exactly_expired(
        entries in prop::collection::btree_map(key_strategy(), any::<bool>(), 1..16),
    ) {
        let mut cache = LruCache::new(64);
        for (&key, &short) in &entries {
            let ttl = if short { Ttl::seconds(1) } else { Ttl::Permanent };
            cache.put(key, key, ttl);
        }

        sleep(Duration::from_millis(1100));

        let expected = entries.values().filter(|&&short| short).count();
        prop_assert_eq!(cache.sweep_expired(), expected);
        for (&key, &short) in &entries {
            prop_assert_eq!(cache.contains(&key), !short);
        }
    }
}
