//! Error types for the token ledger

use drip_common::{Amount, Role};
use thiserror::Error;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller does not hold the role the operation requires
    #[error("{}", .0.denial())]
    Unauthorized(Role),

    #[error("Max supply exceeded: requested {requested}, available {available}")]
    SupplyExceeded { requested: Amount, available: Amount },

    #[error("Insufficient balance: have {balance}, need {needed}")]
    InsufficientBalance { balance: Amount, needed: Amount },

    #[error("Insufficient allowance: have {allowance}, need {needed}")]
    InsufficientAllowance { allowance: Amount, needed: Amount },

    #[error("Zero address not allowed")]
    ZeroAddress,
}

pub type LedgerResult<T> = Result<T, LedgerError>;
