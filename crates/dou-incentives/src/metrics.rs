//! # Incentive Metrics
//!
//! Prometheus counters for the incentive layer.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! dou-incentives = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `dou_messages_accepted_total` - Messages admitted by the spam gate
//! - `dou_messages_rejected_total` - Messages rejected (by reason)
//! - `dou_rewards_paid_total` - Sum of message and validator rewards credited
//! - `dou_validator_selections_total` - Validator selection draws
//! - `dou_validators_registered_total` - Successful registrations

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter, register_int_counter, register_int_counter_vec, Counter, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Messages admitted by the spam gate
    pub static ref MESSAGES_ACCEPTED: IntCounter = register_int_counter!(
        "dou_messages_accepted_total",
        "Total number of messages admitted by the spam gate"
    )
    .expect("Failed to create MESSAGES_ACCEPTED metric");

    /// Messages rejected, labeled by rejection reason
    pub static ref MESSAGES_REJECTED: IntCounterVec = register_int_counter_vec!(
        "dou_messages_rejected_total",
        "Total number of messages rejected",
        &["reason"]
    )
    .expect("Failed to create MESSAGES_REJECTED metric");

    /// Rewards credited to users and validators
    pub static ref REWARDS_PAID: Counter = register_counter!(
        "dou_rewards_paid_total",
        "Total amount of rewards credited"
    )
    .expect("Failed to create REWARDS_PAID metric");

    /// Validator selection draws
    pub static ref VALIDATOR_SELECTIONS: IntCounter = register_int_counter!(
        "dou_validator_selections_total",
        "Total number of validator selections"
    )
    .expect("Failed to create VALIDATOR_SELECTIONS metric");

    /// Validator registrations
    pub static ref VALIDATORS_REGISTERED: IntCounter = register_int_counter!(
        "dou_validators_registered_total",
        "Total number of successful validator registrations"
    )
    .expect("Failed to create VALIDATORS_REGISTERED metric");
}

#[cfg(feature = "metrics")]
pub fn record_message_accepted() {
    MESSAGES_ACCEPTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_message_rejected(reason: &str) {
    MESSAGES_REJECTED.with_label_values(&[reason]).inc();
}

/// Negative or non-finite amounts are ignored; Prometheus counters only go up.
#[cfg(feature = "metrics")]
pub fn record_reward_paid(amount: f64) {
    if amount.is_finite() && amount > 0.0 {
        REWARDS_PAID.inc_by(amount);
    }
}

#[cfg(feature = "metrics")]
pub fn record_validator_selected() {
    VALIDATOR_SELECTIONS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_validator_registered() {
    VALIDATORS_REGISTERED.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_message_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_message_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reward_paid(_amount: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_validator_selected() {}

#[cfg(not(feature = "metrics"))]
pub fn record_validator_registered() {}
