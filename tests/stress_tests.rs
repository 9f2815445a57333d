//! Stress Tests
//!
//! Timed multi-threaded insert and search runs against a single store.
//! Ignored by default; run with `cargo test --release -- --ignored --nocapture`.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::Rng;
use skipcache::{Store, StoreConfig, Ttl};

const THREADS: usize = 10;
const OPS_PER_THREAD: usize = 100_000;
const KEY_SPACE: u32 = 1_000_000;

// == Helper Functions ==

/// Runs `op` on `THREADS` threads, `OPS_PER_THREAD` times each, with random
/// keys. Returns elapsed seconds.
fn run_timed<F>(store: &Arc<Store<u32, String>>, op: F) -> f64
where
    F: Fn(&Store<u32, String>, u32) + Send + Sync + Copy + 'static,
{
    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(store);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..OPS_PER_THREAD {
                    op(&store, rng.gen_range(0..KEY_SPACE));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    start.elapsed().as_secs_f64()
}

// == Throughput ==

#[test]
#[ignore]
fn stress_insert_then_search() {
    let store: Arc<Store<u32, String>> =
        Arc::new(Store::new(StoreConfig::default().with_max_level(18)).unwrap());
    let total = (THREADS * OPS_PER_THREAD) as f64;

    let insert_secs = run_timed(&store, |store, key| {
        let _ = store.insert_element(key, "a".to_string(), Ttl::Permanent);
    });
    println!(
        "insert: {:.3} s, {:.0} ops/s, {} distinct keys",
        insert_secs,
        total / insert_secs,
        store.size()
    );

    let search_secs = run_timed(&store, |store, key| {
        let _ = store.search_element(&key);
    });
    println!("search: {:.3} s, {:.0} ops/s", search_secs, total / search_secs);

    assert!(store.size() <= KEY_SPACE as usize);
    assert!(store.size() > 0);
}
