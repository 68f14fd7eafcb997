//! Error types for the faucet

use drip_common::{DripError, Role, Timestamp};
use drip_ledger::LedgerError;
use thiserror::Error;

/// Faucet errors
#[derive(Error, Debug)]
pub enum FaucetError {
    #[error("{}", .0.denial())]
    Unauthorized(Role),

    #[error("Faucet is paused")]
    FaucetPaused,

    #[error("Cooldown period not elapsed or limit reached")]
    CooldownOrLimitNotElapsed { retry_at: Timestamp },

    #[error("Lifetime claim limit reached")]
    LifetimeLimitReached,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Contracts not deployed")]
    NotDeployed,

    #[error("Contracts already deployed")]
    AlreadyDeployed,
}

impl From<DripError> for FaucetError {
    fn from(err: DripError) -> Self {
        FaucetError::Serialization(err.to_string())
    }
}

/// Stable failure classification, independent of which component raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    FaucetPaused,
    CooldownOrLimitNotElapsed,
    LifetimeLimitReached,
    SupplyExceeded,
    InsufficientBalance,
    InsufficientAllowance,
    InvalidAddress,
    NotDeployed,
    AlreadyDeployed,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::FaucetPaused => "FAUCET_PAUSED",
            ErrorKind::CooldownOrLimitNotElapsed => "COOLDOWN_OR_LIMIT_NOT_ELAPSED",
            ErrorKind::LifetimeLimitReached => "LIFETIME_LIMIT_REACHED",
            ErrorKind::SupplyExceeded => "SUPPLY_EXCEEDED",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::InsufficientAllowance => "INSUFFICIENT_ALLOWANCE",
            ErrorKind::InvalidAddress => "INVALID_ADDRESS",
            ErrorKind::NotDeployed => "NOT_DEPLOYED",
            ErrorKind::AlreadyDeployed => "ALREADY_DEPLOYED",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl FaucetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FaucetError::Unauthorized(_) | FaucetError::Ledger(LedgerError::Unauthorized(_)) => {
                ErrorKind::Unauthorized
            }
            FaucetError::FaucetPaused => ErrorKind::FaucetPaused,
            FaucetError::CooldownOrLimitNotElapsed { .. } => ErrorKind::CooldownOrLimitNotElapsed,
            FaucetError::LifetimeLimitReached => ErrorKind::LifetimeLimitReached,
            FaucetError::Ledger(LedgerError::SupplyExceeded { .. }) => ErrorKind::SupplyExceeded,
            FaucetError::Ledger(LedgerError::InsufficientBalance { .. }) => ErrorKind::InsufficientBalance,
            FaucetError::Ledger(LedgerError::InsufficientAllowance { .. }) => ErrorKind::InsufficientAllowance,
            FaucetError::Ledger(LedgerError::ZeroAddress) => ErrorKind::InvalidAddress,
            FaucetError::NotDeployed => ErrorKind::NotDeployed,
            FaucetError::AlreadyDeployed => ErrorKind::AlreadyDeployed,
            FaucetError::Database(_) | FaucetError::Serialization(_) | FaucetError::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the same call may succeed later without any change by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::FaucetPaused | ErrorKind::CooldownOrLimitNotElapsed
        )
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_contract_reverts() {
        assert_eq!(FaucetError::FaucetPaused.to_string(), "Faucet is paused");
        assert_eq!(
            FaucetError::CooldownOrLimitNotElapsed { retry_at: 1 }.to_string(),
            "Cooldown period not elapsed or limit reached"
        );
        assert_eq!(FaucetError::LifetimeLimitReached.to_string(), "Lifetime claim limit reached");
        assert_eq!(FaucetError::Unauthorized(Role::Admin).to_string(), "Only admin");
    }

    #[test]
    fn test_ledger_errors_keep_their_kind() {
        let err: FaucetError = LedgerError::SupplyExceeded { requested: 10, available: 0 }.into();
        assert_eq!(err.kind(), ErrorKind::SupplyExceeded);
        assert!(err.to_string().starts_with("Max supply exceeded"));

        let err: FaucetError = LedgerError::Unauthorized(Role::Owner).into();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_core_kinds_are_distinct() {
        let kinds = [
            FaucetError::Unauthorized(Role::Admin).kind(),
            FaucetError::FaucetPaused.kind(),
            FaucetError::CooldownOrLimitNotElapsed { retry_at: 0 }.kind(),
            FaucetError::LifetimeLimitReached.kind(),
            FaucetError::from(LedgerError::SupplyExceeded { requested: 1, available: 0 }).kind(),
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), 5);
    }

    #[test]
    fn test_retryable() {
        assert!(FaucetError::FaucetPaused.is_retryable());
        assert!(FaucetError::CooldownOrLimitNotElapsed { retry_at: 5 }.is_retryable());
        assert!(!FaucetError::LifetimeLimitReached.is_retryable());
        assert!(!FaucetError::Unauthorized(Role::Admin).is_retryable());
    }
}
