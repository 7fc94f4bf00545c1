pub mod coins;
pub mod contract;
mod error;
pub mod escrow;
pub mod lifecycle;
pub mod msg;
pub mod refs;
pub mod state;

pub use crate::error::ContractError;
