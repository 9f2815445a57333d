//! Persistence File I/O
//!
//! Renders index snapshots to the record format and streams records back
//! from disk.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::index::SkipList;
use crate::persistence::record::{encode_record, parse_record, ttl_field, Record};

// == Snapshot ==
/// File contents rendered from the index, ready to be written.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub body: String,
    /// Lines rendered
    pub records: usize,
    /// Live entries left out because the format cannot represent them
    pub skipped: usize,
}

/// Renders every live entry in ascending key order.
///
/// Runs while the caller holds the index lock, so it performs no I/O.
pub fn render_snapshot<K, V>(index: &SkipList<K, V>, now: Instant) -> Snapshot
where
    K: Ord + Display,
    V: Display,
{
    let mut snapshot = Snapshot::default();
    for (key, entry) in index.iter() {
        if entry.expiry.is_expired_at(now) {
            continue;
        }
        match encode_record(key, &entry.value, ttl_field(&entry.expiry, now)) {
            Some(line) => {
                snapshot.body.push_str(&line);
                snapshot.body.push('\n');
                snapshot.records += 1;
            }
            None => {
                warn!("Skipping key '{}': not representable as a record", key);
                snapshot.skipped += 1;
            }
        }
    }
    snapshot
}

// == Write ==
/// Truncates `path` and writes `body` to it, creating parent directories.
///
/// Nothing is written if the file cannot be opened.
pub async fn write_snapshot(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let mut file = File::create(path).await.map_err(|e| StoreError::io(path, e))?;
    file.write_all(body.as_bytes())
        .await
        .map_err(|e| StoreError::io(path, e))?;
    file.flush().await.map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

// == Read ==
/// Streams records from a persistence file one line at a time.
pub struct RecordReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl RecordReader {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).await.map_err(|e| StoreError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }

    /// Parses the next non-blank line.
    ///
    /// The outer `Result` fails on I/O errors; the inner one carries a
    /// `MalformedRecord` for lines that do not parse. `None` at end of file.
    pub async fn next_record<K: FromStr, V: FromStr>(
        &mut self,
    ) -> Result<Option<Result<Record<K, V>>>> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| StoreError::io(&self.path, e))?;
            let Some(line) = line else {
                return Ok(None);
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(parse_record(&line, self.line_no)));
        }
    }
}
