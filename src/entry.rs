//! Entry Module
//!
//! Defines the value object stored per key, shared by the skip list index and
//! the recency cache, together with its time-to-live representation.

use std::time::{Duration, Instant};

// == Ttl ==
/// Caller-facing lifetime of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The entry never expires.
    Permanent,
    /// The entry expires once this much time has elapsed after the write.
    After(Duration),
}

impl Ttl {
    /// Convenience constructor for a TTL expressed in whole seconds.
    pub fn seconds(secs: u64) -> Self {
        Ttl::After(Duration::from_secs(secs))
    }
}

// == Expiry ==
/// Absolute expiration of an entry on the monotonic clock.
///
/// `Never` is a distinguished sentinel rather than a far-future instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(Instant),
}

impl Expiry {
    // == Is Expired ==
    /// Checks expiration against an explicit `now`.
    ///
    /// An entry is expired once `now` reaches its expiration instant, so a TTL
    /// of zero is expired immediately.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(at) => now >= *at,
        }
    }

    /// Checks expiration against the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Remaining ==
    /// Returns the time left before expiry, or `None` for permanent entries.
    ///
    /// Saturates at zero for entries that already expired.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match self {
            Expiry::Never => None,
            Expiry::At(at) => Some(at.saturating_duration_since(now)),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Instant::now())
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, Expiry::Never)
    }
}

impl From<Ttl> for Expiry {
    fn from(ttl: Ttl) -> Self {
        match ttl {
            Ttl::Permanent => Expiry::Never,
            // A TTL too large to represent as an instant is as good as permanent.
            Ttl::After(d) => Instant::now()
                .checked_add(d)
                .map(Expiry::At)
                .unwrap_or(Expiry::Never),
        }
    }
}

// == Entry ==
/// A stored value together with its expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    pub value: V,
    pub expiry: Expiry,
}

impl<V> Entry<V> {
    pub fn new(value: V, expiry: Expiry) -> Self {
        Self { value, expiry }
    }

    pub fn is_expired(&self) -> bool {
        self.expiry.is_expired()
    }
}
