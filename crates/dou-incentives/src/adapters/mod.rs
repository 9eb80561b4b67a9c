//! Adapters layer (Hexagonal Architecture)

mod activity_store;
mod snapshot;

pub use activity_store::*;
pub use snapshot::*;
