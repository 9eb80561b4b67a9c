//! # dou-incentives
//!
//! Incentive layer for the DOU messaging network.
//!
//! ## Architecture
//!
//! Three components share one set of injected collaborators (clock,
//! randomness, activity store):
//!
//! ```text
//!                 ┌──────────────────── IncentiveService ────────────────────┐
//!   message ────→ │ SpamGate ──admit──→ RewardLedger ──credit──→ balances    │
//!                 │  (blacklist, rate limit, work proof, reputation)         │
//!                 │                                                          │
//!   round ──────→ │ ValidatorRegistry ──select──→ RewardLedger (payouts)     │
//!                 └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Validator Registry**: stake-weighted, longevity-boosted selection
//! - **Spam Gate**: sliding-window rate limit, proof-of-message-work,
//!   reputation and blacklist
//! - **Reward Ledger**: send, reply and activity rewards with cumulative
//!   accounts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dou_incentives::{IncentiveApi, IncentiveConfig, IncentiveDependencies, IncentiveService, WorkProof};
//!
//! let deps = IncentiveDependencies::in_memory(IncentiveConfig::from_env(), clock, random);
//! let service = IncentiveService::new(deps);
//!
//! let proof = WorkProof::solve(&message, 8);
//! let receipt = service.process_message(&message, &proof, false)?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{
    read_ledger_snapshot, read_registry_snapshot, write_ledger_snapshot, write_registry_snapshot,
    InMemoryActivityStore, LedgerRecord, SnapshotError,
};
pub use config::{ConfigError, IncentiveConfig, RewardConfig, SpamConfig, ValidatorConfig};
pub use domain::{
    IncentiveError, IncentiveResult, MessageReceipt, RewardLedger, SelectionOutcome, SpamGate,
    Validator, ValidatorPayout, ValidatorRegistry, WorkProof,
};
pub use ports::{ActivityRecord, ActivityStore, IncentiveApi};
pub use service::{IncentiveDependencies, IncentiveService};
