//! # Error Types
//!
//! Errors raised while constructing shared entities.

use thiserror::Error;

/// Errors that can occur when building a `Message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Every message needs a sender address.
    #[error("Message sender must not be empty")]
    EmptySender,

    /// Group messages need a group identifier.
    #[error("Group id must not be empty")]
    EmptyGroupId,
}
