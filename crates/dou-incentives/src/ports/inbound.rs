//! Driving ports (Inbound API)

use crate::domain::{IncentiveResult, MessageReceipt, SelectionOutcome, Validator, WorkProof};
use shared_types::{Address, Message};

/// Primary incentive API.
///
/// Every call is synchronous and completes in bounded time, so it is safe
/// to drive from a worker pool or from inside an async task.
pub trait IncentiveApi: Send + Sync {
    /// Gate the message, then compute and credit its reward.
    fn process_message(
        &self,
        message: &Message,
        proof: &WorkProof,
        is_reply: bool,
    ) -> IncentiveResult<MessageReceipt>;

    fn register_validator(&self, address: Address, stake: f64) -> IncentiveResult<()>;

    fn increase_stake(&self, address: &Address, amount: f64) -> IncentiveResult<f64>;

    fn decrease_stake(&self, address: &Address, amount: f64) -> IncentiveResult<f64>;

    fn select_next_validator(&self) -> IncentiveResult<Validator>;

    /// Select a validator and credit its payout.
    fn run_selection_round(&self) -> IncentiveResult<SelectionOutcome>;

    fn top_validators(&self, n: usize) -> Vec<Validator>;

    fn add_to_blacklist(&self, address: &Address) -> bool;

    fn remove_from_blacklist(&self, address: &Address) -> bool;

    fn user_reputation(&self, address: &Address) -> f64;

    fn cumulative_reward(&self, address: &Address) -> f64;
}
