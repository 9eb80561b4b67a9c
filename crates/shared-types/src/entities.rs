//! # Core Domain Entities
//!
//! Identifiers shared by every DOU subsystem.
//!
//! - `Address`: opaque participant identifier, the key of every store
//! - `TxId`: unique message / transaction identifier
//! - `Timestamp`: unix milliseconds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in milliseconds.
pub type Timestamp = u64;

/// One second in `Timestamp` units.
pub const MILLIS_PER_SECOND: u64 = 1_000;

/// One day in `Timestamp` units.
pub const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * MILLIS_PER_SECOND;

/// One (365-day) year in `Timestamp` units.
pub const MILLIS_PER_YEAR: u64 = 365 * MILLIS_PER_DAY;

/// A DOU participant address.
///
/// Opaque and immutable. Equality and ordering are plain byte comparison
/// of the underlying string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap a raw address string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Unique message identifier (`DOU-<millis>-<suffix>`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
