//! Periodic Save Task
//!
//! Background task that dumps the index to disk at a fixed interval.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::{Shared, StoreKey, StoreValue};
use crate::tasks::{current_runtime, PeriodicTask};

/// Spawns a background task that dumps to `path` every `interval`.
///
/// The first dump happens one interval after the start. A failed dump is
/// logged and retried on the next tick.
///
/// # Arguments
/// * `shared` - State shared with the owning store
/// * `path` - Persistence file, rewritten on every dump
/// * `interval` - Time between dumps
pub(crate) fn spawn_save_task<K: StoreKey, V: StoreValue>(
    shared: Arc<Shared<K, V>>,
    path: PathBuf,
    interval: Duration,
) -> Result<PeriodicTask> {
    let runtime = current_runtime()?;
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let handle = runtime.spawn(async move {
        info!(
            "Starting periodic save to {} with interval of {:?}",
            path.display(),
            interval
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stop_rx.changed() => break,
            }

            if let Err(err) = shared.dump_to(&path).await {
                warn!("Periodic save failed: {}", err);
            }
        }

        info!("Periodic save task stopped");
    });

    Ok(PeriodicTask::new("save", stop_tx, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::entry::Ttl;

    fn shared() -> Arc<Shared<String, String>> {
        Arc::new(Shared::new(&StoreConfig::default()))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_save_task_dumps_on_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dumpFile");
        let shared = shared();
        let _ = shared.insert_element("1".into(), "absurd".into(), Ttl::Permanent);

        let interval = Duration::from_millis(200);
        let task = spawn_save_task(shared.clone(), path.clone(), interval).unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        task.stop().await;

        let dumps = shared.dump_count();
        assert!(dumps >= 3, "expected at least 3 dumps, got {}", dumps);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1:absurd:-1\n");

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(shared.dump_count(), dumps);
    }

    #[tokio::test]
    async fn test_save_task_survives_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let shared = shared();

        let interval = Duration::from_millis(100);
        let task = spawn_save_task(shared.clone(), blocker.join("dump"), interval).unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert!(!task.is_finished());
        assert_eq!(shared.dump_count(), 0);
        task.stop().await;
    }
}
