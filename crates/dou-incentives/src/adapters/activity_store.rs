//! In-memory activity store
//!
//! Records older than the window passed to `record_and_count` are pruned on
//! every append, so a sender's history never outgrows one accounting period
//! of activity.

use crate::ports::{ActivityRecord, ActivityStore};
use dashmap::DashMap;
use shared_types::{Address, Timestamp};
use std::collections::VecDeque;

/// `DashMap`-backed activity history.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    histories: DashMap<Address, VecDeque<ActivityRecord>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of senders with retained history.
    pub fn sender_count(&self) -> usize {
        self.histories.len()
    }
}

impl ActivityStore for InMemoryActivityStore {
    fn record_and_count(
        &self,
        sender: &Address,
        record: ActivityRecord,
        window_start: Timestamp,
    ) -> usize {
        let mut history = self.histories.entry(sender.clone()).or_default();
        history.push_back(record);
        history.retain(|r| r.timestamp >= window_start);
        history.len()
    }

    fn count_since(&self, sender: &Address, window_start: Timestamp) -> usize {
        self.histories.get(sender).map_or(0, |history| {
            history
                .iter()
                .filter(|r| r.timestamp >= window_start)
                .count()
        })
    }

    fn history(&self, sender: &Address) -> Vec<ActivityRecord> {
        self.histories
            .get(sender)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn clear(&self) {
        self.histories.clear();
    }
}
