//! Driven ports (Outbound dependencies)
//!
//! Time and randomness come from `shared-types`; the activity store is the
//! reward ledger's own persistence seam.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp, TxId};

pub use shared_types::{RandomSource, TimeSource};

/// One accepted message in a sender's activity history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub tx_id: TxId,
    pub timestamp: Timestamp,
}

/// Per-sender activity history used for the activity bonus.
///
/// Implementations must make `record_and_count` atomic per sender: no
/// concurrent append for the same sender may land between the append and
/// the count.
pub trait ActivityStore: Send + Sync {
    /// Append `record` and return how many of the sender's records have
    /// `timestamp >= window_start`, including the new one if it qualifies.
    fn record_and_count(
        &self,
        sender: &Address,
        record: ActivityRecord,
        window_start: Timestamp,
    ) -> usize;

    /// Records of `sender` with `timestamp >= window_start`.
    fn count_since(&self, sender: &Address, window_start: Timestamp) -> usize;

    /// Full retained history of `sender`, oldest first.
    fn history(&self, sender: &Address) -> Vec<ActivityRecord>;

    /// Forget everything.
    fn clear(&self);
}
