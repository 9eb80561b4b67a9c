//! Validator domain entity
//!
//! Stake, tenure and the values derived from them. Nothing derived is
//! stored: eligibility, age and priority are recomputed from the current
//! stake and the supplied `now` on every query.

use super::{IncentiveError, IncentiveResult};
use crate::config::ValidatorConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Timestamp, MILLIS_PER_YEAR};

/// A staked validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Validator {
    address: Address,
    stake: f64,
    join_time: Timestamp,
}

impl Validator {
    pub fn new(address: Address, stake: f64, join_time: Timestamp) -> Self {
        Self {
            address,
            stake,
            join_time,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn stake(&self) -> f64 {
        self.stake
    }

    pub fn join_time(&self) -> Timestamp {
        self.join_time
    }

    /// Time since joining. A join time in the future counts as age zero.
    pub fn age_millis(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.join_time)
    }

    pub fn age_years(&self, now: Timestamp) -> f64 {
        self.age_millis(now) as f64 / MILLIS_PER_YEAR as f64
    }

    /// `stake >= minimum_stake`
    pub fn is_eligible(&self, params: &ValidatorConfig) -> bool {
        self.stake >= params.minimum_stake
    }

    /// `min(stake / minimum_stake, max_stake_multiplier)`
    pub fn stake_factor(&self, params: &ValidatorConfig) -> f64 {
        (self.stake / params.minimum_stake).min(params.max_stake_multiplier)
    }

    /// `1 + base_reward_rate * age_in_years`
    pub fn longevity_factor(&self, params: &ValidatorConfig, now: Timestamp) -> f64 {
        1.0 + params.base_reward_rate * self.age_years(now)
    }

    /// Selection and ranking weight.
    pub fn priority_score(&self, params: &ValidatorConfig, now: Timestamp) -> f64 {
        self.stake_factor(params) * self.longevity_factor(params, now)
    }

    pub fn base_reward(&self, params: &ValidatorConfig) -> f64 {
        self.stake * params.base_reward_rate
    }

    pub fn longevity_bonus(&self, params: &ValidatorConfig, now: Timestamp) -> f64 {
        self.base_reward(params) * (self.longevity_factor(params, now) - 1.0)
    }

    pub(crate) fn increase_stake(&mut self, amount: f64) -> IncentiveResult<f64> {
        check_amount(amount)?;
        let updated = self.stake + amount;
        if !updated.is_finite() {
            return Err(IncentiveError::InvalidStakeOperation(format!(
                "stake overflow adding {amount} to {}",
                self.stake
            )));
        }
        self.stake = updated;
        Ok(updated)
    }

    /// Fails without touching the stake if it would go negative.
    pub(crate) fn decrease_stake(&mut self, amount: f64) -> IncentiveResult<f64> {
        check_amount(amount)?;
        if amount > self.stake {
            return Err(IncentiveError::InvalidStakeOperation(format!(
                "cannot remove {amount} from stake {}",
                self.stake
            )));
        }
        self.stake -= amount;
        Ok(self.stake)
    }
}

fn check_amount(amount: f64) -> IncentiveResult<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(IncentiveError::InvalidStakeOperation(format!(
            "amount must be positive, got {amount}"
        )))
    }
}
