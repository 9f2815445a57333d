//! Background Tasks Module
//!
//! Periodic maintenance running on the Tokio runtime alongside the store.
//!
//! # Tasks
//! - Save: dumps the index to the configured file at a fixed interval
//! - TTL Cleanup: removes expired entries from the index and the cache

mod cleanup;
mod save;

pub(crate) use cleanup::spawn_cleanup_task;
pub(crate) use save::spawn_save_task;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{Result, StoreError};

// == Periodic Task ==
/// Handle to a running background loop.
///
/// The loop watches a stop flag and exits at its next wake after the flag is
/// raised or the handle is dropped.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    pub(crate) fn new(
        name: &'static str,
        stop_tx: watch::Sender<bool>,
        handle: JoinHandle<()>,
    ) -> Self {
        Self {
            name,
            stop_tx,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Raises the stop flag without waiting.
    pub fn signal(&self) {
        // Fails only when the loop has already exited.
        let _ = self.stop_tx.send(true);
    }

    /// Waits for the loop to exit.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            warn!("{} task ended abnormally: {}", self.name, err);
        }
    }

    /// Signals the loop and waits for it.
    pub async fn stop(self) {
        self.signal();
        self.join().await;
    }
}

/// Handle of the runtime the caller is running on.
pub(crate) fn current_runtime() -> Result<Handle> {
    Handle::try_current().map_err(|e| StoreError::Runtime(e.to_string()))
}
