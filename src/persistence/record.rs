//! Record Codec
//!
//! One entry per line: `key:value:remaining_ttl_seconds`, where a TTL of `-1`
//! marks a permanent entry.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Instant;

use crate::entry::{Expiry, Ttl};
use crate::error::{Result, StoreError};

// == Format Constants ==
pub const DELIMITER: char = ':';

/// TTL field value written for entries that never expire.
pub const PERMANENT_TTL: i64 = -1;

// == Record ==
/// A decoded line of a persistence file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<K, V> {
    pub key: K,
    pub value: V,
    pub ttl: Ttl,
}

// == Encode ==
/// Remaining lifetime as written to disk.
///
/// Rounds up to whole seconds so that an entry still alive at dump time is
/// still alive when the file is loaded again.
pub fn ttl_field(expiry: &Expiry, now: Instant) -> i64 {
    match expiry.remaining_at(now) {
        None => PERMANENT_TTL,
        Some(remaining) => {
            let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            i64::try_from(secs).unwrap_or(i64::MAX)
        }
    }
}

/// Formats one record line, without the trailing newline.
///
/// Returns `None` when the key or value cannot be represented: empty fields,
/// a delimiter inside the key, or a line break anywhere.
pub fn encode_record<K: Display, V: Display>(key: &K, value: &V, ttl_secs: i64) -> Option<String> {
    let key = key.to_string();
    let value = value.to_string();
    let breaks_line = |s: &str| s.contains(|c: char| c == '\n' || c == '\r');

    if key.is_empty() || value.is_empty() || key.contains(DELIMITER) {
        return None;
    }
    if breaks_line(&key) || breaks_line(&value) {
        return None;
    }
    Some(format!("{key}{DELIMITER}{value}{DELIMITER}{ttl_secs}"))
}

// == Parse ==
/// Parses one line. The key ends at the first delimiter and the TTL starts
/// after the last one, so values may themselves contain delimiters.
pub fn parse_record<K: FromStr, V: FromStr>(line: &str, line_no: usize) -> Result<Record<K, V>> {
    let line = line.trim_end_matches('\r');

    let (key, rest) = line
        .split_once(DELIMITER)
        .ok_or_else(|| StoreError::malformed(line_no, "missing delimiter"))?;
    let (value, ttl) = rest
        .rsplit_once(DELIMITER)
        .ok_or_else(|| StoreError::malformed(line_no, "missing ttl field"))?;

    if key.is_empty() {
        return Err(StoreError::malformed(line_no, "empty key"));
    }
    if value.is_empty() {
        return Err(StoreError::malformed(line_no, "empty value"));
    }

    let ttl = match ttl.trim().parse::<i64>() {
        Ok(PERMANENT_TTL) => Ttl::Permanent,
        Ok(secs) if secs >= 0 => Ttl::seconds(secs as u64),
        Ok(secs) => {
            return Err(StoreError::malformed(line_no, format!("negative ttl {}", secs)));
        }
        Err(_) => {
            return Err(StoreError::malformed(line_no, format!("invalid ttl '{}'", ttl)));
        }
    };

    let key = key
        .parse()
        .map_err(|_| StoreError::malformed(line_no, format!("unparsable key '{}'", key)))?;
    let value = value
        .parse()
        .map_err(|_| StoreError::malformed(line_no, "unparsable value"))?;

    Ok(Record { key, value, ttl })
}
