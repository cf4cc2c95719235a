//! Serde helpers that encode [`Duration`] values as whole milliseconds.
//!
//! Configuration files and the wire snapshot both express durations as plain
//! integers, so fields use `#[serde(with = "millis")]`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serialises a duration as an integer millisecond count.
pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(saturating_millis(*duration))
}

/// Deserialises a duration from an integer millisecond count.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Whole milliseconds contained in the duration, clamped to `u64::MAX`.
#[must_use]
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
