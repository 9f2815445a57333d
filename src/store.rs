//! Store Module
//!
//! Composes the skip list index and the recency cache into one thread-safe
//! key-value store with write-through inserts, read-through lookups, text-file
//! persistence and background maintenance.
//!
//! # Locking
//! The index and the cache each sit behind their own mutex. Whenever both are
//! needed the index lock is taken first; the cache is never locked while
//! waiting for the index. Persistence file access is serialized by a separate
//! async mutex, and a dump holds the index lock only while rendering.

use std::fmt::Display;
use std::hash::Hash;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, LruCache};
use crate::config::StoreConfig;
use crate::entry::{Expiry, Ttl};
use crate::error::Result;
use crate::index::{DeleteOutcome, InsertOutcome, SkipList};
use crate::persistence::{render_snapshot, write_snapshot, DumpReport, LoadReport, RecordReader};
use crate::tasks::{spawn_cleanup_task, spawn_save_task, PeriodicTask};

// == Bounds ==
/// Requirements on store keys: ordered for the index, hashable for the
/// cache, and printable/parsable for persistence.
pub trait StoreKey: Ord + Hash + Clone + Display + FromStr + Send + Sync + 'static {}

impl<T> StoreKey for T where T: Ord + Hash + Clone + Display + FromStr + Send + Sync + 'static {}

/// Requirements on store values.
pub trait StoreValue: Clone + Display + FromStr + Send + Sync + 'static {}

impl<T> StoreValue for T where T: Clone + Display + FromStr + Send + Sync + 'static {}

// == Store Stats ==
/// Point-in-time view of the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Entries in the index, including expired ones not yet swept
    pub elements: usize,
    /// Current skip list level
    pub level: usize,
    /// Successful dumps since the store was created
    pub dumps: u64,
    pub cache: CacheStats,
}

// == Shared State ==
/// State reachable from both foreground callers and background tasks.
pub(crate) struct Shared<K, V> {
    index: Mutex<SkipList<K, V>>,
    cache: Mutex<LruCache<K, V>>,
    io_lock: tokio::sync::Mutex<()>,
    dumps: AtomicU64,
}

impl<K: StoreKey, V: StoreValue> Shared<K, V> {
    pub(crate) fn new(config: &StoreConfig) -> Self {
        Self {
            index: Mutex::new(SkipList::new(config.max_level)),
            cache: Mutex::new(LruCache::new(config.cache_capacity)),
            io_lock: tokio::sync::Mutex::new(()),
            dumps: AtomicU64::new(0),
        }
    }

    pub(crate) fn insert_element(&self, key: K, value: V, ttl: Ttl) -> InsertOutcome {
        let expiry = Expiry::from(ttl);
        let mut index = self.index.lock();

        let outcome = index.insert(key.clone(), value.clone(), expiry);
        match outcome {
            InsertOutcome::Inserted => {
                debug!("Inserted key '{}' (ttl: {:?})", key, ttl);
                self.cache.lock().put(key, value, expiry);
            }
            InsertOutcome::AlreadyExists => debug!("Key '{}' already exists", key),
        }
        outcome
    }

    pub(crate) fn search_element(&self, key: &K) -> Option<V> {
        if let Some(value) = self.cache.lock().get(key) {
            return Some(value);
        }

        let mut index = self.index.lock();
        let entry = index.search(key)?;
        // Backfill under the index lock so a concurrent delete cannot be
        // overtaken by a stale cache entry.
        self.cache.lock().put(key.clone(), entry.value.clone(), entry.expiry);
        Some(entry.value)
    }

    fn delete_element(&self, key: &K) -> DeleteOutcome {
        let mut index = self.index.lock();
        let outcome = index.delete(key);
        self.cache.lock().remove(key);
        if outcome == DeleteOutcome::Deleted {
            debug!("Deleted key '{}'", key);
        }
        outcome
    }

    /// Sweeps expired entries from the index, then from the cache.
    pub(crate) fn remove_expired(&self) -> usize {
        let removed = self.index.lock().remove_expired();
        let swept = self.cache.lock().sweep_expired();
        debug!("Expiry sweep: {} index entries, {} cache entries", removed, swept);
        removed
    }

    pub(crate) fn dump_count(&self) -> u64 {
        self.dumps.load(Ordering::Relaxed)
    }

    pub(crate) async fn dump_to(&self, path: &Path) -> Result<DumpReport> {
        let _io = self.io_lock.lock().await;

        let snapshot = {
            let index = self.index.lock();
            render_snapshot(&index, Instant::now())
        };
        write_snapshot(path, &snapshot.body).await?;
        self.dumps.fetch_add(1, Ordering::Relaxed);

        info!("Dumped {} records to {}", snapshot.records, path.display());
        Ok(DumpReport {
            path: path.to_path_buf(),
            records: snapshot.records,
            skipped: snapshot.skipped,
            completed_at: Utc::now(),
        })
    }

    async fn load_from(&self, path: &Path) -> Result<LoadReport> {
        let _io = self.io_lock.lock().await;

        let mut reader = RecordReader::open(path).await?;
        let mut report = LoadReport::default();
        while let Some(parsed) = reader.next_record::<K, V>().await? {
            let record = match parsed {
                Ok(record) => record,
                Err(err) => {
                    warn!("Skipping record in {}: {}", path.display(), err);
                    report.malformed += 1;
                    continue;
                }
            };
            if record.ttl == Ttl::After(Duration::ZERO) {
                report.expired += 1;
                continue;
            }
            match self.insert_element(record.key, record.value, record.ttl) {
                InsertOutcome::Inserted => report.inserted += 1,
                InsertOutcome::AlreadyExists => report.duplicates += 1,
            }
        }

        info!(
            "Loaded {} records from {} ({} duplicates, {} malformed, {} expired)",
            report.inserted,
            path.display(),
            report.duplicates,
            report.malformed,
            report.expired
        );
        Ok(report)
    }
}

// == Store ==
/// Thread-safe key-value store: skip list index fronted by an LRU+TTL cache.
///
/// Foreground operations are synchronous and may be called from any number
/// of threads (share the store through an `Arc`). Persistence and the
/// background tasks need a Tokio runtime.
///
/// # Example
/// ```no_run
/// use skipcache::{Store, StoreConfig, Ttl};
///
/// # async fn demo() -> skipcache::error::Result<()> {
/// let store: Store<String, String> = Store::new(StoreConfig::default())?;
/// let _ = store.insert_element("1".into(), "absurd".into(), Ttl::seconds(3600));
/// assert_eq!(store.search_element(&"1".to_string()), Some("absurd".to_string()));
/// store.dump().await?;
/// store.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Store<K, V> {
    shared: Arc<Shared<K, V>>,
    config: StoreConfig,
    save_task: Mutex<Option<PeriodicTask>>,
    cleanup_task: Mutex<Option<PeriodicTask>>,
}

impl<K: StoreKey, V: StoreValue> Store<K, V> {
    // == Constructor ==
    /// Creates an empty store after validating `config`.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared::new(&config)),
            config,
            save_task: Mutex::new(None),
            cleanup_task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // == Insert ==
    /// Inserts a new key into the index and writes it through to the cache.
    ///
    /// A live existing key is left untouched and `AlreadyExists` is returned.
    pub fn insert_element(&self, key: K, value: V, ttl: Ttl) -> InsertOutcome {
        self.shared.insert_element(key, value, ttl)
    }

    // == Search ==
    /// Looks `key` up in the cache, then in the index.
    ///
    /// An index hit is copied back into the cache with the entry's own
    /// remaining lifetime.
    pub fn search_element(&self, key: &K) -> Option<V> {
        self.shared.search_element(key)
    }

    // == Delete ==
    /// Removes `key` from the index and always drops it from the cache.
    pub fn delete_element(&self, key: &K) -> DeleteOutcome {
        self.shared.delete_element(key)
    }

    /// Number of entries in the index.
    pub fn size(&self) -> usize {
        self.shared.index.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Removes every expired entry now. Returns the index removals.
    pub fn remove_expired(&self) -> usize {
        self.shared.remove_expired()
    }

    // == Views ==
    /// Live `(key, value)` pairs in ascending key order.
    pub fn entries(&self) -> Vec<(K, V)> {
        let index = self.shared.index.lock();
        let now = Instant::now();
        index
            .iter()
            .filter(|(_, entry)| !entry.expiry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Live entries with their remaining lifetime (`None` = permanent).
    pub fn entries_with_ttl(&self) -> Vec<(K, V, Option<Duration>)> {
        let index = self.shared.index.lock();
        let now = Instant::now();
        index
            .iter()
            .filter(|(_, entry)| !entry.expiry.is_expired_at(now))
            .map(|(key, entry)| {
                (key.clone(), entry.value.clone(), entry.expiry.remaining_at(now))
            })
            .collect()
    }

    /// One `Level i: key:value;...` line per index level.
    pub fn display_structure(&self) -> String {
        self.shared.index.lock().to_string()
    }

    pub fn stats(&self) -> StoreStats {
        let (elements, level) = {
            let index = self.shared.index.lock();
            (index.len(), index.level())
        };
        StoreStats {
            elements,
            level,
            dumps: self.dump_count(),
            cache: self.shared.cache.lock().stats(),
        }
    }

    // == Persistence ==
    /// Writes every live entry to the configured dump path.
    pub async fn dump(&self) -> Result<DumpReport> {
        self.shared.dump_to(&self.config.dump_path).await
    }

    pub async fn dump_to(&self, path: impl AsRef<Path>) -> Result<DumpReport> {
        self.shared.dump_to(path.as_ref()).await
    }

    /// Inserts the records of the configured dump path.
    pub async fn load(&self) -> Result<LoadReport> {
        self.shared.load_from(&self.config.dump_path).await
    }

    /// Inserts the records of `path`. Keys already present are kept, not
    /// overwritten; malformed lines are skipped.
    pub async fn load_from(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        self.shared.load_from(path.as_ref()).await
    }

    /// Successful dumps so far, from any caller or the save task.
    pub fn dump_count(&self) -> u64 {
        self.shared.dump_count()
    }

    // == Background Tasks ==
    /// Starts dumping to the configured path every `interval`.
    ///
    /// Does nothing if the save task is already running.
    pub fn periodic_save(&self, interval: Duration) -> Result<()> {
        let mut slot = self.save_task.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Periodic save already running");
            return Ok(());
        }
        let task = spawn_save_task(
            Arc::clone(&self.shared),
            self.config.dump_path.clone(),
            interval,
        )?;
        *slot = Some(task);
        Ok(())
    }

    /// Starts sweeping expired entries every `interval`.
    ///
    /// Does nothing if the cleanup task is already running.
    pub fn periodic_cleanup(&self, interval: Duration) -> Result<()> {
        let mut slot = self.cleanup_task.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Periodic cleanup already running");
            return Ok(());
        }
        *slot = Some(spawn_cleanup_task(Arc::clone(&self.shared), interval)?);
        Ok(())
    }

    /// Starts both tasks with the configured intervals.
    pub fn start_background_tasks(&self) -> Result<()> {
        self.periodic_save(self.config.save_interval)?;
        self.periodic_cleanup(self.config.cleanup_interval)
    }

    /// Stops the save task and waits for it to finish.
    pub async fn stop_periodic_save(&self) {
        let task = self.save_task.lock().take();
        if let Some(task) = task {
            task.stop().await;
        }
    }

    /// Stops the cleanup task and waits for it to finish.
    pub async fn stop_periodic_cleanup(&self) {
        let task = self.cleanup_task.lock().take();
        if let Some(task) = task {
            task.stop().await;
        }
    }

    pub fn is_saving(&self) -> bool {
        self.save_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn is_cleaning(&self) -> bool {
        self.cleanup_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    // == Shutdown ==
    /// Stops both background tasks, waits for them, and releases the store.
    pub async fn shutdown(self) {
        let save = self.save_task.lock().take();
        let cleanup = self.cleanup_task.lock().take();
        let tasks: Vec<PeriodicTask> = save.into_iter().chain(cleanup).collect();

        for task in &tasks {
            task.signal();
        }
        for task in tasks {
            task.join().await;
        }
        info!("Store shut down");
    }
}

impl<K, V> Drop for Store<K, V> {
    fn drop(&mut self) {
        // Tasks still running here were never shut down; signal them so they
        // exit on their next wake. They hold their own reference to the state.
        for slot in [&self.save_task, &self.cleanup_task] {
            if let Some(task) = slot.lock().take() {
                task.signal();
                warn!("Store dropped without shutdown, {} task signalled", task.name());
            }
        }
    }
}
