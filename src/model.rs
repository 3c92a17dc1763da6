//! Core domain types for the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Amount;

/// Account identifier.
pub type Username = String;

/// Opaque transaction identifier (hex-encoded random bytes).
pub type TxId = String;

/// An operation the ledger can be asked to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Credit coins to an account.
    Deposit { username: Username, amount: Amount },
    /// Debit coins from an account.
    Withdraw { username: Username, amount: Amount },
    /// Move coins from one account to another.
    Transfer {
        from: Username,
        to: Username,
        amount: Amount,
    },
}

/// Successful result of [`LedgerStore::apply`](crate::LedgerStore::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Balance(Balance),
    Transfer { from: Balance, to: Balance },
}

/// Point-in-time copy of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub username: Username,
    pub coins: Amount,
    /// Bumped on every successful mutation of the account.
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Deposit => "DEPOSIT",
            TxKind::Withdrawal => "WITHDRAWAL",
            TxKind::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of an attempted operation, as written to the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Success,
    FailedInvalidAmount,
    FailedUserNotFound,
    FailedFromUserNotFound,
    FailedToUserNotFound,
    FailedInsufficientFunds,
    FailedSelfTransfer,
    FailedContextCancelled,
    FailedOverflow,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Success => "SUCCESS",
            TxStatus::FailedInvalidAmount => "FAILED_INVALID_AMOUNT",
            TxStatus::FailedUserNotFound => "FAILED_USER_NOT_FOUND",
            TxStatus::FailedFromUserNotFound => "FAILED_FROM_USER_NOT_FOUND",
            TxStatus::FailedToUserNotFound => "FAILED_TO_USER_NOT_FOUND",
            TxStatus::FailedInsufficientFunds => "FAILED_INSUFFICIENT_FUNDS",
            TxStatus::FailedSelfTransfer => "FAILED_SELF_TRANSFER",
            TxStatus::FailedContextCancelled => "FAILED_CONTEXT_CANCELLED",
            TxStatus::FailedOverflow => "FAILED_OVERFLOW",
        }
    }

    pub fn is_success(self) -> bool {
        self == TxStatus::Success
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit entry describing one attempted operation.
///
/// `from` is empty for deposits and `to` is empty for withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TxId,
    pub kind: TxKind,
    pub from: Username,
    pub to: Username,
    /// Requested amount, kept even when the attempt failed.
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub status: TxStatus,
}

impl TransactionRecord {
    /// Whether `username` is on either side of this record.
    pub fn involves(&self, username: &str) -> bool {
        self.from == username || self.to == username
    }
}
