//! # Shared Types Crate
//!
//! Entities and collaborator ports shared by every DOU crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Address`, `TxId`, `Timestamp` and `Message`
//!   are defined once here.
//! - **Injected time and randomness**: nothing reads the system clock or
//!   seeds a generator on its own; components receive a `TimeSource` and a
//!   `RandomSource`.

pub mod clock;
pub mod entities;
pub mod errors;
pub mod message;
pub mod random;

pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use entities::*;
pub use errors::*;
pub use message::{content_hash, Message, MessageKind, MessageType, TxIdGenerator};
pub use random::{RandomSource, SeededRandomSource};
