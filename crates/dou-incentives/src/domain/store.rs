//! # Address-keyed Stores
//!
//! Leaf state behind the spam gate: sliding rate-limit windows, reputation
//! scores and the blacklist.
//!
//! All three are `DashMap`-backed. Read-modify-write sequences on one
//! address (prune + append, score increment) run while holding that
//! address's entry guard, so they are serialized per address; different
//! addresses only contend at shard granularity and never for longer than
//! a single map operation.

use dashmap::{DashMap, DashSet};
use shared_types::{Address, Timestamp};
use std::collections::VecDeque;
use tracing::debug;

/// Per-address sliding window of accepted message timestamps.
#[derive(Debug, Default, Clone)]
pub struct RateLimitWindow {
    timestamps: VecDeque<Timestamp>,
    /// Last time this address was checked, accepted or not
    last_seen: Timestamp,
}

impl RateLimitWindow {
    /// Drop timestamps with `now - ts >= period`.
    fn prune(&mut self, now: Timestamp, period: u64) {
        self.timestamps
            .retain(|&ts| now.saturating_sub(ts) < period);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Recorded; carries the window length after recording.
    Accepted(usize),
    /// Not recorded; carries the window length that hit the cap.
    Rejected(usize),
}

/// Sliding-window rate limiter keyed by address.
#[derive(Debug)]
pub struct RateLimitStore {
    windows: DashMap<Address, RateLimitWindow>,
    max_per_period: usize,
    period_millis: u64,
}

impl RateLimitStore {
    pub fn new(max_per_period: usize, period_millis: u64) -> Self {
        Self {
            windows: DashMap::new(),
            max_per_period,
            period_millis,
        }
    }

    /// Prune, then record `now` if the window is below the cap.
    pub fn check_and_record(&self, address: &Address, now: Timestamp) -> WindowDecision {
        let mut window = self.windows.entry(address.clone()).or_default();
        window.prune(now, self.period_millis);
        window.last_seen = now;

        if window.len() >= self.max_per_period {
            return WindowDecision::Rejected(window.len());
        }
        window.timestamps.push_back(now);
        WindowDecision::Accepted(window.len())
    }

    /// Messages from `address` still inside the window at `now`.
    pub fn window_len(&self, address: &Address, now: Timestamp) -> usize {
        self.windows.get(address).map_or(0, |window| {
            window
                .timestamps
                .iter()
                .filter(|&&ts| now.saturating_sub(ts) < self.period_millis)
                .count()
        })
    }

    /// Drop windows that are empty after pruning and idle for at least
    /// `retention` millis. Returns the number removed.
    pub fn purge_idle(&self, now: Timestamp, retention: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now, self.period_millis);
            !window.is_empty() || now.saturating_sub(window.last_seen) < retention
        });
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            debug!(removed, "Purged idle rate-limit windows");
        }
        removed
    }

    pub fn tracked_addresses(&self) -> usize {
        self.windows.len()
    }
}

/// Reputation scores, `0.0` for unseen addresses.
#[derive(Debug, Default)]
pub struct ReputationStore {
    scores: DashMap<Address, f64>,
}

impl ReputationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` and return the new score.
    pub fn adjust(&self, address: &Address, delta: f64) -> f64 {
        let mut score = self.scores.entry(address.clone()).or_insert(0.0);
        *score += delta;
        *score
    }

    pub fn get(&self, address: &Address) -> f64 {
        self.scores.get(address).map_or(0.0, |score| *score)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Set of banned addresses.
#[derive(Debug, Default)]
pub struct Blacklist {
    entries: DashSet<Address>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the address was not listed before.
    pub fn insert(&self, address: &Address) -> bool {
        self.entries.insert(address.clone())
    }

    /// Returns `true` if the address was listed.
    pub fn remove(&self, address: &Address) -> bool {
        self.entries.remove(address).is_some()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains(address)
    }

    /// Sorted copy of all listed addresses.
    pub fn addresses(&self) -> Vec<Address> {
        let mut all: Vec<Address> = self.entries.iter().map(|a| a.key().clone()).collect();
        all.sort();
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
