//! # Reward Ledger
//!
//! Per-message reward computation and cumulative reward accounts.
//!
//! ## Rewards
//!
//! ```text
//! send      = base_send_reward
//! reply     = base_send_reward × reply_multiplier
//! activity  = base_send_reward × activity_bonus_ratio   if count ≥ threshold
//! total     = send + (is_reply ? reply : 0) + activity(count after recording)
//! ```
//!
//! `count` is the number of the sender's messages recorded inside the
//! accounting period ending now. Records are stamped with the ledger clock,
//! not the caller-supplied message timestamp. The history lives in an
//! injected `ActivityStore`, so separate ledgers never share state.
//!
//! Replies are not checked against the original message; pairing them is
//! the caller's contract (see `Message::is_reply_to`).

use crate::config::RewardConfig;
use crate::ports::{ActivityRecord, ActivityStore};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Message, TimeSource, Timestamp, TxId};
use std::sync::Arc;
use tracing::debug;

/// One validator payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorPayout {
    pub timestamp: Timestamp,
    pub amount: f64,
    pub multiplier: f64,
}

/// Settlement of one admitted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub tx_id: TxId,
    pub sender: Address,
    pub reward: f64,
    pub cumulative_reward: f64,
    pub reputation: f64,
}

/// Result of one validator selection round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub validator: Address,
    pub stake: f64,
    pub base_reward: f64,
    pub longevity_bonus: f64,
    pub payout: f64,
    pub total_validator_reward: f64,
}

#[derive(Debug, Default)]
struct ValidatorAccount {
    total: f64,
    payouts: Vec<ValidatorPayout>,
}

/// Message reward calculator and balance book.
pub struct RewardLedger {
    config: RewardConfig,
    history: Arc<dyn ActivityStore>,
    clock: Arc<dyn TimeSource>,
    balances: DashMap<Address, f64>,
    validator_accounts: DashMap<Address, ValidatorAccount>,
}

impl RewardLedger {
    pub fn new(
        config: RewardConfig,
        history: Arc<dyn ActivityStore>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            history,
            clock,
            balances: DashMap::new(),
            validator_accounts: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    fn period_start(&self) -> Timestamp {
        self.clock
            .now_millis()
            .saturating_sub(self.config.accounting_period_millis())
    }

    /// Append to the sender's history; returns the in-period count.
    fn record(&self, message: &Message) -> usize {
        let now = self.clock.now_millis();
        let record = ActivityRecord {
            tx_id: message.tx_id().clone(),
            timestamp: now,
        };
        let window_start = now.saturating_sub(self.config.accounting_period_millis());
        self.history
            .record_and_count(message.sender(), record, window_start)
    }

    /// Records the message and returns the base send reward.
    pub fn send_reward(&self, message: &Message) -> f64 {
        self.record(message);
        self.config.base_send_reward
    }

    pub fn reply_reward(&self, _original: &Message, _reply: &Message) -> f64 {
        self.config.base_send_reward * self.config.reply_multiplier
    }

    pub fn activity_bonus(&self, _user: &Address, messages_in_period: usize) -> f64 {
        if messages_in_period >= self.config.activity_bonus_threshold {
            self.config.base_send_reward * self.config.activity_bonus_ratio
        } else {
            0.0
        }
    }

    /// Records the message and returns send + reply + activity bonus. The
    /// bonus sees the count including this message.
    pub fn total_reward(&self, message: &Message, is_reply: bool) -> f64 {
        let count = self.record(message);
        let send = self.config.base_send_reward;
        let reply = if is_reply {
            self.reply_reward(message, message)
        } else {
            0.0
        };
        let bonus = self.activity_bonus(message.sender(), count);

        debug!(
            sender = %message.sender(),
            tx_id = %message.tx_id(),
            count,
            reward = send + reply + bonus,
            "Message reward computed"
        );
        send + reply + bonus
    }

    /// Messages from `user` recorded inside the current accounting period.
    pub fn count_in_current_period(&self, user: &Address) -> usize {
        self.history.count_since(user, self.period_start())
    }

    pub fn activity_history(&self, user: &Address) -> Vec<ActivityRecord> {
        self.history.history(user)
    }

    /// Add `amount` to the user's balance; returns the new balance.
    pub fn credit(&self, user: &Address, amount: f64) -> f64 {
        let mut balance = self.balances.entry(user.clone()).or_insert(0.0);
        *balance += amount;
        *balance
    }

    pub fn cumulative_reward(&self, user: &Address) -> f64 {
        self.balances.get(user).map_or(0.0, |b| *b)
    }

    /// All balances, sorted by address.
    pub fn balances(&self) -> Vec<(Address, f64)> {
        let mut all: Vec<(Address, f64)> = self
            .balances
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Replace all balances.
    pub fn restore_balances(&self, balances: impl IntoIterator<Item = (Address, f64)>) {
        self.balances.clear();
        for (address, amount) in balances {
            self.balances.insert(address, amount);
        }
    }

    /// Pay `base_reward × multiplier` to a validator; returns the amount.
    pub fn credit_validator(&self, validator: &Address, base_reward: f64, multiplier: f64) -> f64 {
        let amount = base_reward * multiplier;
        let payout = ValidatorPayout {
            timestamp: self.clock.now_millis(),
            amount,
            multiplier,
        };

        let mut account = self.validator_accounts.entry(validator.clone()).or_default();
        account.total += amount;
        account.payouts.push(payout);

        debug!(%validator, amount, multiplier, "Validator reward credited");
        amount
    }

    pub fn validator_total_reward(&self, validator: &Address) -> f64 {
        self.validator_accounts
            .get(validator)
            .map_or(0.0, |account| account.total)
    }

    pub fn validator_reward_history(&self, validator: &Address) -> Vec<ValidatorPayout> {
        self.validator_accounts
            .get(validator)
            .map(|account| account.payouts.clone())
            .unwrap_or_default()
    }
}
