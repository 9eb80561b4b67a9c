//! Configuration types for the incentive layer
//!
//! Defaults reproduce the network constants; `from_env` overlays the
//! operator-tunable subset.

use serde::Deserialize;
use shared_types::MILLIS_PER_SECOND;
use std::env;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Minimum stake for a validator to be eligible.
pub const MINIMUM_STAKE: f64 = 100.0;
/// Cap on the stake factor of the priority score.
pub const MAX_STAKE_MULTIPLIER: f64 = 1.5;
/// Yearly base reward rate; also the longevity slope.
pub const BASE_REWARD_RATE: f64 = 0.01;

/// Messages allowed per sender inside one rate-limit window.
pub const MAX_MESSAGES_PER_PERIOD: usize = 10;
/// Rate-limit window length (5 minutes).
pub const MESSAGE_PERIOD_SECS: u64 = 300;
/// Largest meaningful work-proof difficulty (digest prefix bits searched).
pub const MAX_POW_DIFFICULTY_BITS: u32 = 64;

/// Reward for sending one message.
pub const BASE_SEND_REWARD: f64 = 0.1;
/// Reply reward multiplier.
pub const REPLY_MULTIPLIER: f64 = 1.5;
/// Messages in the accounting period needed for the activity bonus.
pub const ACTIVITY_BONUS_THRESHOLD: usize = 10;

/// Complete incentive layer configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct IncentiveConfig {
    pub validator: ValidatorConfig,
    pub spam: SpamConfig,
    pub rewards: RewardConfig,
}

/// Validator registry parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Eligibility threshold
    pub minimum_stake: f64,
    /// Upper bound of `stake / minimum_stake` in the priority score
    pub max_stake_multiplier: f64,
    /// Base reward per unit of stake
    pub base_reward_rate: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            minimum_stake: MINIMUM_STAKE,
            max_stake_multiplier: MAX_STAKE_MULTIPLIER,
            base_reward_rate: BASE_REWARD_RATE,
        }
    }
}

/// Spam gate parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    pub max_messages_per_period: usize,
    pub message_period_secs: u64,
    /// Required leading zero bits of the work-proof digest (0 disables)
    pub pow_difficulty_bits: u32,
    /// Reputation added on an accepted message
    pub reputation_reward: f64,
    /// Reputation removed on a rejected message
    pub reputation_penalty: f64,
    /// Empty windows idle this long are dropped by `purge_idle`
    pub idle_window_retention_secs: u64,
}

impl SpamConfig {
    pub fn message_period_millis(&self) -> u64 {
        self.message_period_secs.saturating_mul(MILLIS_PER_SECOND)
    }

    pub fn idle_retention_millis(&self) -> u64 {
        self.idle_window_retention_secs.saturating_mul(MILLIS_PER_SECOND)
    }

    /// Bound a work-proof difficulty to what `WorkProof::solve` can reach.
    pub fn check_difficulty(bits: u32) -> Result<u32, ConfigError> {
        if bits > MAX_POW_DIFFICULTY_BITS {
            return Err(ConfigError::DifficultyTooHigh(bits));
        }
        Ok(bits)
    }
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            max_messages_per_period: MAX_MESSAGES_PER_PERIOD,
            message_period_secs: MESSAGE_PERIOD_SECS,
            pow_difficulty_bits: 8,
            reputation_reward: 1.0,
            reputation_penalty: 2.0,
            idle_window_retention_secs: 3_600,
        }
    }
}

/// Reward ledger parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub base_send_reward: f64,
    pub reply_multiplier: f64,
    pub activity_bonus_threshold: usize,
    /// Fraction of the send reward paid as activity bonus
    pub activity_bonus_ratio: f64,
    pub accounting_period_secs: u64,
}

impl RewardConfig {
    pub fn accounting_period_millis(&self) -> u64 {
        self.accounting_period_secs.saturating_mul(MILLIS_PER_SECOND)
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            base_send_reward: BASE_SEND_REWARD,
            reply_multiplier: REPLY_MULTIPLIER,
            activity_bonus_threshold: ACTIVITY_BONUS_THRESHOLD,
            activity_bonus_ratio: 0.5,
            accounting_period_secs: 86_400,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("minimum stake must be positive, got {0}")]
    NonPositiveMinimumStake(f64),

    #[error("message period must be non-zero")]
    ZeroMessagePeriod,

    #[error("message cap per period must be non-zero")]
    ZeroMessageCap,

    #[error("accounting period must be non-zero")]
    ZeroAccountingPeriod,

    #[error("maximum stake multiplier must be positive, got {0}")]
    NonPositiveStakeMultiplier(f64),

    #[error("base reward rate must not be negative, got {0}")]
    NegativeRewardRate(f64),

    #[error("proof-of-work difficulty {0} exceeds 64 bits")]
    DifficultyTooHigh(u32),
}


impl IncentiveConfig {
    /// Defaults overlaid with environment overrides.
    ///
    /// # Environment Variables
    ///
    /// - `DOU_MINIMUM_STAKE`
    /// - `DOU_MAX_MESSAGES_PER_PERIOD`
    /// - `DOU_MESSAGE_PERIOD_SECS`
    /// - `DOU_POW_DIFFICULTY_BITS`
    /// - `DOU_ACCOUNTING_PERIOD_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        override_from_env("DOU_MINIMUM_STAKE", &mut config.validator.minimum_stake);
        override_from_env(
            "DOU_MAX_MESSAGES_PER_PERIOD",
            &mut config.spam.max_messages_per_period,
        );
        override_from_env(
            "DOU_MESSAGE_PERIOD_SECS",
            &mut config.spam.message_period_secs,
        );
        override_from_env(
            "DOU_POW_DIFFICULTY_BITS",
            &mut config.spam.pow_difficulty_bits,
        );
        override_from_env(
            "DOU_ACCOUNTING_PERIOD_SECS",
            &mut config.rewards.accounting_period_secs,
        );
        config
    }

    /// Reject configurations the components cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let minimum = self.validator.minimum_stake;
        if minimum.is_nan() || minimum <= 0.0 {
            return Err(ConfigError::NonPositiveMinimumStake(
                self.validator.minimum_stake,
            ));
        }
        let multiplier = self.validator.max_stake_multiplier;
        if multiplier.is_nan() || multiplier <= 0.0 {
            return Err(ConfigError::NonPositiveStakeMultiplier(multiplier));
        }
        let rate = self.validator.base_reward_rate;
        if rate.is_nan() || rate < 0.0 {
            return Err(ConfigError::NegativeRewardRate(rate));
        }
        if self.spam.message_period_secs == 0 {
            return Err(ConfigError::ZeroMessagePeriod);
        }
        if self.spam.max_messages_per_period == 0 {
            return Err(ConfigError::ZeroMessageCap);
        }
        if self.rewards.accounting_period_secs == 0 {
            return Err(ConfigError::ZeroAccountingPeriod);
        }
        SpamConfig::check_difficulty(self.spam.pow_difficulty_bits)?;
        Ok(())
    }
}

fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = env::var(key) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparsable environment override"),
        }
    }
}
