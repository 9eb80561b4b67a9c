//! # Messages
//!
//! The read-only message record handed to the incentive core. Construction,
//! hashing and ID generation live here so the core only ever sees a sender,
//! a timestamp, a type tag and a content fingerprint.
//!
//! Private and group messages are a tagged variant (`MessageKind`) rather
//! than a type hierarchy; consumers match on the kind when they care.

use crate::clock::TimeSource;
use crate::entities::{Address, Timestamp, TxId, MILLIS_PER_DAY};
use crate::errors::MessageError;
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Default storage lifetime of a message.
pub const DEFAULT_MESSAGE_TTL_MS: u64 = MILLIS_PER_DAY;

/// Upper bound (inclusive) of the random suffix in generated transaction IDs.
pub const TX_ID_SUFFIX_MAX: u32 = 99_999;

/// Message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Private,
    Group,
}

/// Destination of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Direct message to a single receiver.
    Private { receiver: Address },
    /// Message broadcast to a group.
    Group { group_id: String },
}

/// A constructed message.
///
/// Deserialization goes through the same sender and group id checks as the
/// constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord")]
pub struct Message {
    tx_id: TxId,
    sender: Address,
    content_hash: String,
    timestamp: Timestamp,
    kind: MessageKind,
    storage_expiry: Option<Timestamp>,
}

/// Unchecked wire form of `Message`.
#[derive(Deserialize)]
struct MessageRecord {
    tx_id: TxId,
    sender: Address,
    content_hash: String,
    timestamp: Timestamp,
    kind: MessageKind,
    storage_expiry: Option<Timestamp>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = MessageError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        if record.sender.is_empty() {
            return Err(MessageError::EmptySender);
        }
        if matches!(&record.kind, MessageKind::Group { group_id } if group_id.is_empty()) {
            return Err(MessageError::EmptyGroupId);
        }
        Ok(Self {
            tx_id: record.tx_id,
            sender: record.sender,
            content_hash: record.content_hash,
            timestamp: record.timestamp,
            kind: record.kind,
            storage_expiry: record.storage_expiry,
        })
    }
}

impl Message {
    /// Build a private message. Fails fast on an empty sender.
    pub fn private(
        tx_id: TxId,
        sender: Address,
        receiver: Address,
        content: &str,
        timestamp: Timestamp,
    ) -> Result<Self, MessageError> {
        Self::build(tx_id, sender, content, timestamp, MessageKind::Private { receiver })
    }

    /// Build a group message. Fails fast on an empty sender or group id.
    pub fn group(
        tx_id: TxId,
        sender: Address,
        group_id: impl Into<String>,
        content: &str,
        timestamp: Timestamp,
    ) -> Result<Self, MessageError> {
        let group_id = group_id.into();
        if group_id.is_empty() {
            return Err(MessageError::EmptyGroupId);
        }
        Self::build(tx_id, sender, content, timestamp, MessageKind::Group { group_id })
    }

    fn build(
        tx_id: TxId,
        sender: Address,
        content: &str,
        timestamp: Timestamp,
        kind: MessageKind,
    ) -> Result<Self, MessageError> {
        if sender.is_empty() {
            return Err(MessageError::EmptySender);
        }
        Ok(Self {
            tx_id,
            sender,
            content_hash: content_hash(content),
            timestamp,
            kind,
            storage_expiry: None,
        })
    }

    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    /// Receiver of a private message; `None` for group messages.
    pub fn receiver(&self) -> Option<&Address> {
        match &self.kind {
            MessageKind::Private { receiver } => Some(receiver),
            MessageKind::Group { .. } => None,
        }
    }

    /// Group id of a group message; `None` for private messages.
    pub fn group_id(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Group { group_id } => Some(group_id),
            MessageKind::Private { .. } => None,
        }
    }

    /// Hex SHA-256 of the message body.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn message_type(&self) -> MessageType {
        match self.kind {
            MessageKind::Private { .. } => MessageType::Private,
            MessageKind::Group { .. } => MessageType::Group,
        }
    }

    /// True if `self` answers `original` within the same conversation:
    /// a private reply goes back to the original sender, a group reply
    /// stays in the same group.
    pub fn is_reply_to(&self, original: &Message) -> bool {
        match (&self.kind, &original.kind) {
            (MessageKind::Private { receiver }, MessageKind::Private { receiver: orig_rx }) => {
                receiver == &original.sender && orig_rx == &self.sender
            }
            (MessageKind::Group { group_id }, MessageKind::Group { group_id: orig_group }) => {
                group_id == orig_group
            }
            _ => false,
        }
    }

    /// Keep the message stored for `days` days after its timestamp.
    pub fn extend_storage(&mut self, days: u32) {
        let extension = u64::from(days).saturating_mul(MILLIS_PER_DAY);
        self.storage_expiry = Some(self.timestamp.saturating_add(extension));
    }

    /// Instant after which the message may be dropped from storage.
    pub fn expires_at(&self) -> Timestamp {
        self.storage_expiry
            .unwrap_or(self.timestamp.saturating_add(DEFAULT_MESSAGE_TTL_MS))
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at()
    }
}

/// Lowercase hex SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Generates `DOU-<unix_millis>-<suffix>` transaction IDs from injected
/// time and randomness.
pub struct TxIdGenerator {
    clock: Arc<dyn TimeSource>,
    random: Arc<dyn RandomSource>,
}

impl TxIdGenerator {
    pub fn new(clock: Arc<dyn TimeSource>, random: Arc<dyn RandomSource>) -> Self {
        Self { clock, random }
    }

    pub fn next_id(&self) -> TxId {
        let suffix = self.random.next_u32() % (TX_ID_SUFFIX_MAX + 1);
        TxId::new(format!("DOU-{}-{}", self.clock.now_millis(), suffix))
    }

    /// Build a private message stamped with the generator's clock.
    pub fn private_message(
        &self,
        sender: Address,
        receiver: Address,
        content: &str,
    ) -> Result<Message, MessageError> {
        Message::private(
            self.next_id(),
            sender,
            receiver,
            content,
            self.clock.now_millis(),
        )
    }

    /// Build a group message stamped with the generator's clock.
    pub fn group_message(
        &self,
        sender: Address,
        group_id: impl Into<String>,
        content: &str,
    ) -> Result<Message, MessageError> {
        Message::group(
            self.next_id(),
            sender,
            group_id,
            content,
            self.clock.now_millis(),
        )
    }
}
