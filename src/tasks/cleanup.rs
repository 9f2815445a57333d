//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the index
//! and the cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Result;
use crate::store::{Shared, StoreKey, StoreValue};
use crate::tasks::{current_runtime, PeriodicTask};

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The first sweep runs immediately, then the task sleeps between runs until
/// it is stopped.
///
/// # Arguments
/// * `shared` - State shared with the owning store
/// * `interval` - Time between sweeps
///
/// # Returns
/// A `PeriodicTask` used to stop and join the loop, or `StoreError::Runtime`
/// when called outside a Tokio runtime.
pub(crate) fn spawn_cleanup_task<K: StoreKey, V: StoreValue>(
    shared: Arc<Shared<K, V>>,
    interval: Duration,
) -> Result<PeriodicTask> {
    let runtime = current_runtime()?;
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let handle = runtime.spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            let removed = shared.remove_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stop_rx.changed() => break,
            }
        }

        info!("TTL cleanup task stopped");
    });

    Ok(PeriodicTask::new("cleanup", stop_tx, handle))
}
