//! Error types for the incentive layer

use shared_types::Address;

/// Incentive layer error types.
///
/// Every variant is a recoverable, caller-visible outcome.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IncentiveError {
    #[error("Stake {stake} is below the minimum of {minimum}")]
    IneligibleStake { stake: f64, minimum: f64 },

    #[error("Invalid stake operation: {0}")]
    InvalidStakeOperation(String),

    #[error("No eligible validators")]
    NoEligibleValidators,

    #[error("Unknown validator: {0}")]
    UnknownValidator(Address),

    #[error("Sender is blacklisted: {0}")]
    Blacklisted(Address),

    #[error("Rate limit exceeded for {address}: {count} messages in window, limit {limit}")]
    RateLimitExceeded {
        address: Address,
        count: usize,
        limit: usize,
    },

    #[error("Invalid proof of message work: {0}")]
    InvalidProofOfWork(String),
}

impl IncentiveError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::IneligibleStake { .. } => "ineligible_stake",
            Self::InvalidStakeOperation(_) => "invalid_stake_operation",
            Self::NoEligibleValidators => "no_eligible_validators",
            Self::UnknownValidator(_) => "unknown_validator",
            Self::Blacklisted(_) => "blacklisted",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::InvalidProofOfWork(_) => "invalid_proof_of_work",
        }
    }

    /// Whether this error was produced by the spam gate.
    pub fn is_gate_rejection(&self) -> bool {
        matches!(
            self,
            Self::Blacklisted(_) | Self::RateLimitExceeded { .. } | Self::InvalidProofOfWork(_)
        )
    }
}

/// Result type for incentive operations
pub type IncentiveResult<T> = Result<T, IncentiveError>;
