use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Lock {id} not found")]
    NotFound { id: u64 },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Lock {id} is already unlocking")]
    AlreadyUnlocking { id: u64 },

    #[error("Custody transfer failed: {reason}")]
    CustodyTransferFailed { reason: String },

    /// Storage no longer satisfies the lock/index invariants. Never recoverable.
    #[error("Invariant violated: {reason}")]
    Invariant { reason: String },
}

impl ContractError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        ContractError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn custody(reason: impl Into<String>) -> Self {
        ContractError::CustodyTransferFailed {
            reason: reason.into(),
        }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        ContractError::Invariant {
            reason: reason.into(),
        }
    }
}
