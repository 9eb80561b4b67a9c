//! # Time Sources
//!
//! Wall clock abstraction injected into every component that reasons about
//! time windows, validator age, or message expiry.

use crate::entities::{Timestamp, MILLIS_PER_SECOND};
use std::sync::atomic::{AtomicU64, Ordering};

/// Time source for window and age computations.
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in milliseconds.
    fn now_millis(&self) -> Timestamp;

    /// Current unix timestamp in seconds.
    fn now_secs(&self) -> u64 {
        self.now_millis() / MILLIS_PER_SECOND
    }
}

/// Default time source using system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs * MILLIS_PER_SECOND);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_millis(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
