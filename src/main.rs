//! skipcache - test vector replay
//!
//! Reads `N` followed by `N` lines of `key value ttl` from stdin, inserts
//! them into a store and persists the result.

use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skipcache::{InsertOutcome, Store, StoreConfig, Ttl};

/// One parsed test vector line.
struct Element {
    key: String,
    value: String,
    ttl: Ttl,
}

/// Main entry point for the replay driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Restore the previous dump if one exists
/// 4. Start the periodic save and cleanup tasks
/// 5. Insert the test vector, then dump and shut down
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skipcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env();
    info!(
        "Configuration loaded: max_level={}, cache_capacity={}, dump_path={}, \
         save_interval={:?}, cleanup_interval={:?}",
        config.max_level,
        config.cache_capacity,
        config.dump_path.display(),
        config.save_interval,
        config.cleanup_interval
    );

    let store: Store<String, String> = Store::new(config).context("invalid configuration")?;

    if store.config().dump_path.exists() {
        let report = store.load().await.context("failed to load previous dump")?;
        info!("Restored {} entries", report.inserted);
    }

    store
        .start_background_tasks()
        .context("failed to start background tasks")?;

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("failed to read test vector from stdin")?;
    let elements = parse_elements(&input)?;

    for element in elements {
        match store.insert_element(element.key, element.value, element.ttl) {
            InsertOutcome::Inserted => println!("Insert Success"),
            InsertOutcome::AlreadyExists => println!("Insert Failed"),
        }
    }

    print!("{}", store.display_structure());

    let report = store.dump().await.context("failed to dump store")?;
    info!("Wrote {} records to {}", report.records, report.path.display());
    if report.skipped > 0 {
        warn!("{} entries could not be written", report.skipped);
    }

    println!("{}", serde_json::to_string_pretty(&store.stats())?);

    store.shutdown().await;
    Ok(())
}

/// Parses `N` then `N` whitespace-separated `key value ttl` triples.
fn parse_elements(input: &str) -> anyhow::Result<Vec<Element>> {
    let mut tokens = input.split_whitespace();
    let count: usize = tokens
        .next()
        .context("missing element count")?
        .parse()
        .context("element count is not a number")?;

    let mut elements = Vec::with_capacity(count);
    for i in 0..count {
        let (Some(key), Some(value), Some(ttl)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            bail!("expected {} elements, input ends after {}", count, i);
        };
        let ttl: i64 = ttl
            .parse()
            .with_context(|| format!("invalid ttl '{}' for key '{}'", ttl, key))?;
        let ttl = match ttl {
            -1 => Ttl::Permanent,
            secs if secs >= 0 => Ttl::After(Duration::from_secs(secs as u64)),
            secs => bail!("negative ttl {} for key '{}'", secs, key),
        };
        elements.push(Element {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        });
    }
    Ok(elements)
}
