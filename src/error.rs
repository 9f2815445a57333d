//! Error types for the store
//!
//! Provides unified error handling using thiserror. Missing keys and duplicate
//! inserts are ordinary outcomes (see `InsertOutcome` / `DeleteOutcome`), not
//! errors.

use std::path::PathBuf;

use thiserror::Error;

// == Store Error Enum ==
/// Unified error type for the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A persistence file could not be opened, read or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted line does not have the `key:value:ttl` shape
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A background task was started without an async runtime
    #[error("Runtime unavailable: {0}")]
    Runtime(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        StoreError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the store.
pub type Result<T> = std::result::Result<T, StoreError>;
