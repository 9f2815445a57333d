//! skipcache - An in-process key-value store
//!
//! Keeps entries ordered in a skip list index, fronts it with an LRU cache,
//! expires entries by TTL and persists them to a plain text file.

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod index;
pub mod persistence;
pub mod store;
mod tasks;

pub use cache::CacheStats;
pub use config::StoreConfig;
pub use entry::{Entry, Expiry, Ttl};
pub use error::{Result, StoreError};
pub use index::{DeleteOutcome, InsertOutcome};
pub use persistence::{DumpReport, LoadReport};
pub use store::{Store, StoreKey, StoreStats, StoreValue};
