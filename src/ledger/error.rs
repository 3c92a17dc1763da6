//! Error types for ledger operations.

use thiserror::Error;

use crate::Amount;
use crate::context::CancelReason;
use crate::model::{TxKind, TxStatus, Username};

/// Error returned by the audited ledger operations (deposit, withdrawal, transfer)
/// and by balance lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid amount {0}: must be positive")]
    InvalidAmount(Amount),

    #[error("user {0} not found")]
    UserNotFound(Username),

    #[error("insufficient funds for {username}: available {available}, requested {requested}")]
    InsufficientFunds {
        username: Username,
        available: Amount,
        requested: Amount,
    },

    #[error("self-transfer not allowed for {0}")]
    SelfTransferNotAllowed(Username),

    #[error("{0}")]
    Cancelled(CancelReason),

    #[error("balance of {0} would overflow")]
    Overflow(Username),
}

impl LedgerError {
    /// Audit status recorded for this failure. `from` is the sending side of
    /// the attempt and tells the two transfer lookups apart.
    pub fn audit_status(&self, kind: TxKind, from: &str) -> TxStatus {
        match self {
            LedgerError::InvalidAmount(_) => TxStatus::FailedInvalidAmount,
            LedgerError::UserNotFound(name) => match kind {
                TxKind::Transfer if name == from => TxStatus::FailedFromUserNotFound,
                TxKind::Transfer => TxStatus::FailedToUserNotFound,
                _ => TxStatus::FailedUserNotFound,
            },
            LedgerError::InsufficientFunds { .. } => TxStatus::FailedInsufficientFunds,
            LedgerError::SelfTransferNotAllowed(_) => TxStatus::FailedSelfTransfer,
            LedgerError::Cancelled(_) => TxStatus::FailedContextCancelled,
            LedgerError::Overflow(_) => TxStatus::FailedOverflow,
        }
    }
}

/// Error while opening an account.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpenAccountError {
    #[error("account {0} already exists")]
    AccountExists(Username),

    #[error("account {0} cannot open with negative balance {1}")]
    NegativeBalance(Username, Amount),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_lookup_failures_name_the_side() {
        let err = LedgerError::UserNotFound("aaron".to_string());
        assert_eq!(
            err.audit_status(TxKind::Transfer, "aaron"),
            TxStatus::FailedFromUserNotFound
        );
        assert_eq!(
            err.audit_status(TxKind::Transfer, "bryan"),
            TxStatus::FailedToUserNotFound
        );
        assert_eq!(
            err.audit_status(TxKind::Deposit, ""),
            TxStatus::FailedUserNotFound
        );
    }

    #[test]
    fn cancelled_message_carries_reason() {
        let err = LedgerError::Cancelled(CancelReason::DeadlineExceeded);
        assert_eq!(err.to_string(), "context deadline exceeded");
        assert_eq!(
            err.audit_status(TxKind::Transfer, "a"),
            TxStatus::FailedContextCancelled
        );
    }
}
