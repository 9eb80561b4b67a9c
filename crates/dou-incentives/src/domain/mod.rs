//! Domain layer for the incentive subsystem
//!
//! - validator / registry: stake-weighted validator selection
//! - store / pomw / spam_gate: message admission control
//! - rewards: message rewards and payout accounts

mod error;
mod pomw;
mod registry;
mod rewards;
mod spam_gate;
mod store;
mod validator;

pub use error::*;
pub use pomw::*;
pub use registry::*;
pub use rewards::*;
pub use spam_gate::*;
pub use store::*;
pub use validator::*;
