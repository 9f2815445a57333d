//! Index Module
//!
//! Ordered key-value index backed by a probabilistic skip list.

mod skiplist;


pub use skiplist::{Iter, SkipList};

// == Public Constants ==
/// Upper bound accepted for a skip list's configured maximum level.
pub const MAX_LEVEL_LIMIT: usize = 32;

// == Outcomes ==
/// Result of inserting a key.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A live entry already holds this key; nothing was changed.
    AlreadyExists,
}

/// Result of deleting a key.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}
