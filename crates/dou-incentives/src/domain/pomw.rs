//! # Proof-of-Message-Work
//!
//! Hash-prefix work proof bound to one message: its transaction id, sender
//! and content fingerprint. Repeating the same text still costs fresh work.
//!
//! ## Scheme
//!
//! ```text
//! digest = SHA-256(tx_id ‖ 0x00 ‖ sender ‖ 0x00 ‖ content_hash ‖ nonce as u64 little-endian)
//! valid  ⇔ leading_zero_bits(digest) >= difficulty_bits
//! ```
//!
//! The separator bytes keep `("ab", "c…")` and `("a", "bc…")` apart. A
//! difficulty of zero accepts any nonce.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::Message;

/// Caller-supplied work proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkProof {
    pub nonce: u64,
}

impl WorkProof {
    pub fn new(nonce: u64) -> Self {
        Self { nonce }
    }

    pub fn digest(&self, message: &Message) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(message.tx_id().as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(message.sender().as_bytes());
        hasher.update([0u8]);
        hasher.update(message.content_hash().as_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn meets_difficulty(&self, message: &Message, difficulty_bits: u32) -> bool {
        difficulty_bits == 0 || leading_zero_bits(&self.digest(message)) >= difficulty_bits
    }

    /// Search nonces from zero until one meets `difficulty_bits`.
    ///
    /// Expected work is `2^difficulty_bits` hashes.
    pub fn solve(message: &Message, difficulty_bits: u32) -> Self {
        (0u64..)
            .map(WorkProof::new)
            .find(|proof| proof.meets_difficulty(message, difficulty_bits))
            .unwrap_or(WorkProof::new(0))
    }
}

/// Count of leading zero bits across `bytes`.
pub fn leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut bits = 0;
    for &byte in bytes {
        if byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}
