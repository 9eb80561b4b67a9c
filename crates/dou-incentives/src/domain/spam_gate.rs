//! # Spam Gate
//!
//! Admission control for inbound messages.
//!
//! ## Check Order
//!
//! 1. Blacklist: rejects with no state change at all
//! 2. Rate limit: prune the sender's window, reject at the cap, otherwise
//!    record the attempt
//! 3. Proof-of-message-work
//!
//! The first failing check ends evaluation. After step 1, the sender's
//! reputation moves up on acceptance and down on any rejection.
//!
//! A message that passes the rate limit but fails the work proof keeps its
//! slot in the window: the attempt was made and counts against the sender.

use super::store::{Blacklist, RateLimitStore, ReputationStore, WindowDecision};
use super::{IncentiveError, IncentiveResult, WorkProof};
use crate::config::SpamConfig;
use shared_types::{Address, Message, TimeSource};
use std::sync::Arc;
use tracing::{debug, info};

/// Rate limiting, work-proof validation, reputation and blacklist.
pub struct SpamGate {
    config: SpamConfig,
    rate_limits: RateLimitStore,
    reputation: ReputationStore,
    blacklist: Blacklist,
    clock: Arc<dyn TimeSource>,
}

impl SpamGate {
    pub fn new(config: SpamConfig, clock: Arc<dyn TimeSource>) -> Self {
        let rate_limits =
            RateLimitStore::new(config.max_messages_per_period, config.message_period_millis());
        Self {
            config,
            rate_limits,
            reputation: ReputationStore::new(),
            blacklist: Blacklist::new(),
            clock,
        }
    }

    pub fn config(&self) -> &SpamConfig {
        &self.config
    }

    /// Run every check in order for `message`.
    pub fn admit(&self, message: &Message, proof: &WorkProof) -> IncentiveResult<()> {
        let sender = message.sender();
        if self.is_blacklisted(sender) {
            debug!(%sender, tx_id = %message.tx_id(), "Rejected blacklisted sender");
            return Err(IncentiveError::Blacklisted(sender.clone()));
        }

        let outcome = self
            .check_rate_limit(sender)
            .and_then(|()| self.validate_proof_of_message_work(message, proof));

        let reputation = self.update_user_reputation(sender, outcome.is_ok());
        if let Err(err) = &outcome {
            debug!(
                %sender,
                tx_id = %message.tx_id(),
                reason = err.reason(),
                reputation,
                "Message rejected"
            );
        }
        outcome
    }

    /// Prune the sender's window and record this attempt if under the cap.
    pub fn check_rate_limit(&self, sender: &Address) -> IncentiveResult<()> {
        match self
            .rate_limits
            .check_and_record(sender, self.clock.now_millis())
        {
            WindowDecision::Accepted(_) => Ok(()),
            WindowDecision::Rejected(count) => Err(IncentiveError::RateLimitExceeded {
                address: sender.clone(),
                count,
                limit: self.config.max_messages_per_period,
            }),
        }
    }

    pub fn validate_proof_of_message_work(
        &self,
        message: &Message,
        proof: &WorkProof,
    ) -> IncentiveResult<()> {
        if proof.meets_difficulty(message, self.config.pow_difficulty_bits) {
            Ok(())
        } else {
            Err(IncentiveError::InvalidProofOfWork(format!(
                "nonce {} does not reach {} leading zero bits",
                proof.nonce, self.config.pow_difficulty_bits
            )))
        }
    }

    /// Nudge reputation by the configured reward or penalty. Returns the
    /// new score.
    pub fn update_user_reputation(&self, user: &Address, positive_interaction: bool) -> f64 {
        let delta = if positive_interaction {
            self.config.reputation_reward
        } else {
            -self.config.reputation_penalty
        };
        self.reputation.adjust(user, delta)
    }

    /// `0.0` for addresses never seen.
    pub fn get_user_reputation(&self, user: &Address) -> f64 {
        self.reputation.get(user)
    }

    /// Idempotent. Returns `true` if the address was newly listed.
    pub fn add_to_blacklist(&self, user: &Address) -> bool {
        let added = self.blacklist.insert(user);
        if added {
            info!(%user, "Address blacklisted");
        }
        added
    }

    /// Returns `true` if the address was listed.
    pub fn remove_from_blacklist(&self, user: &Address) -> bool {
        let removed = self.blacklist.remove(user);
        if removed {
            info!(%user, "Address removed from blacklist");
        }
        removed
    }

    pub fn is_blacklisted(&self, user: &Address) -> bool {
        self.blacklist.contains(user)
    }

    pub fn blacklisted_addresses(&self) -> Vec<Address> {
        self.blacklist.addresses()
    }

    /// Messages from `sender` inside the current window.
    pub fn window_len(&self, sender: &Address) -> usize {
        self.rate_limits
            .window_len(sender, self.clock.now_millis())
    }

    /// Drop rate-limit state for senders idle longer than the retention.
    pub fn purge_idle(&self) -> usize {
        self.rate_limits
            .purge_idle(self.clock.now_millis(), self.config.idle_retention_millis())
    }
}
