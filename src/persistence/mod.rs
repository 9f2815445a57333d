//! Persistence Module
//!
//! Line-oriented text persistence of the index: one `key:value:ttl` record per
//! line, fully rewritten on every dump.

mod file;
mod record;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use file::{render_snapshot, write_snapshot, RecordReader, Snapshot};
pub use record::{encode_record, parse_record, ttl_field, Record, DELIMITER, PERMANENT_TTL};

// == Reports ==
/// Summary of a completed dump.
#[derive(Debug, Clone, Serialize)]
pub struct DumpReport {
    pub path: PathBuf,
    /// Records written
    pub records: usize,
    /// Live entries the format could not represent
    pub skipped: usize,
    pub completed_at: DateTime<Utc>,
}

/// Summary of a completed load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    /// Records whose key was already present and live
    pub duplicates: usize,
    /// Lines that did not parse
    pub malformed: usize,
    /// Records persisted with no time left
    pub expired: usize,
}
