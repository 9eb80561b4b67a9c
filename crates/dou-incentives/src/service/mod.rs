//! Incentive Service - wires the registry, spam gate and reward ledger
//!
//! A message is settled in three steps: the spam gate admits it, the
//! ledger computes its reward, and the reward is credited to the sender.
//! Rejected messages earn nothing and leave the ledger untouched.

use crate::adapters::InMemoryActivityStore;
use crate::config::IncentiveConfig;
use crate::domain::{
    IncentiveResult, MessageReceipt, RewardLedger, SelectionOutcome, SpamGate, Validator,
    ValidatorRegistry, WorkProof,
};
use crate::metrics;
use crate::ports::{ActivityStore, IncentiveApi, RandomSource, TimeSource};
use shared_types::{Address, Message};
use std::sync::Arc;
use tracing::info;

/// Dependencies for IncentiveService
pub struct IncentiveDependencies {
    pub config: IncentiveConfig,
    pub clock: Arc<dyn TimeSource>,
    pub random: Arc<dyn RandomSource>,
    pub activity_store: Arc<dyn ActivityStore>,
}

impl IncentiveDependencies {
    /// Dependencies backed by an in-memory activity store.
    pub fn in_memory(
        config: IncentiveConfig,
        clock: Arc<dyn TimeSource>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            config,
            clock,
            random,
            activity_store: Arc::new(InMemoryActivityStore::new()),
        }
    }
}

/// Incentive Service
pub struct IncentiveService {
    registry: Arc<ValidatorRegistry>,
    gate: Arc<SpamGate>,
    ledger: Arc<RewardLedger>,
}

impl IncentiveService {
    pub fn new(deps: IncentiveDependencies) -> Self {
        let IncentiveConfig {
            validator,
            spam,
            rewards,
        } = deps.config;

        Self {
            registry: Arc::new(ValidatorRegistry::new(
                validator,
                deps.clock.clone(),
                deps.random,
            )),
            gate: Arc::new(SpamGate::new(spam, deps.clock.clone())),
            ledger: Arc::new(RewardLedger::new(rewards, deps.activity_store, deps.clock)),
        }
    }

    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    pub fn gate(&self) -> &Arc<SpamGate> {
        &self.gate
    }

    pub fn ledger(&self) -> &Arc<RewardLedger> {
        &self.ledger
    }
}

impl IncentiveApi for IncentiveService {
    fn process_message(
        &self,
        message: &Message,
        proof: &WorkProof,
        is_reply: bool,
    ) -> IncentiveResult<MessageReceipt> {
        if let Err(err) = self.gate.admit(message, proof) {
            metrics::record_message_rejected(err.reason());
            return Err(err);
        }
        metrics::record_message_accepted();

        let sender = message.sender();
        let reward = self.ledger.total_reward(message, is_reply);
        let cumulative_reward = self.ledger.credit(sender, reward);
        metrics::record_reward_paid(reward);

        Ok(MessageReceipt {
            tx_id: message.tx_id().clone(),
            sender: sender.clone(),
            reward,
            cumulative_reward,
            reputation: self.gate.get_user_reputation(sender),
        })
    }

    fn register_validator(&self, address: Address, stake: f64) -> IncentiveResult<()> {
        self.registry.register_stake(address, stake)
    }

    fn increase_stake(&self, address: &Address, amount: f64) -> IncentiveResult<f64> {
        self.registry.increase_stake(address, amount)
    }

    fn decrease_stake(&self, address: &Address, amount: f64) -> IncentiveResult<f64> {
        self.registry.decrease_stake(address, amount)
    }

    fn select_next_validator(&self) -> IncentiveResult<Validator> {
        self.registry.select_next_validator()
    }

    fn run_selection_round(&self) -> IncentiveResult<SelectionOutcome> {
        let validator = self.registry.select_next_validator()?;
        let params = self.registry.params();
        let now = self.registry.now();

        let base_reward = validator.base_reward(params);
        let longevity_bonus = validator.longevity_bonus(params, now);
        let payout = self.ledger.credit_validator(
            validator.address(),
            base_reward,
            validator.longevity_factor(params, now),
        );
        metrics::record_reward_paid(payout);

        info!(
            validator = %validator.address(),
            stake = validator.stake(),
            payout,
            "Selection round settled"
        );

        Ok(SelectionOutcome {
            validator: validator.address().clone(),
            stake: validator.stake(),
            base_reward,
            longevity_bonus,
            payout,
            total_validator_reward: self.ledger.validator_total_reward(validator.address()),
        })
    }

    fn top_validators(&self, n: usize) -> Vec<Validator> {
        self.registry.top_validators(n)
    }

    fn add_to_blacklist(&self, address: &Address) -> bool {
        self.gate.add_to_blacklist(address)
    }

    fn remove_from_blacklist(&self, address: &Address) -> bool {
        self.gate.remove_from_blacklist(address)
    }

    fn user_reputation(&self, address: &Address) -> f64 {
        self.gate.get_user_reputation(address)
    }

    fn cumulative_reward(&self, address: &Address) -> f64 {
        self.ledger.cumulative_reward(address)
    }
}
