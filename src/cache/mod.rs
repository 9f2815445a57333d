//! Cache Module
//!
//! Provides the bounded recency cache placed in front of the skip list index,
//! with TTL expiration and LRU eviction.

mod lru;
mod lru_cache;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use lru::RecencyList;
pub use lru_cache::LruCache;
pub use stats::CacheStats;
