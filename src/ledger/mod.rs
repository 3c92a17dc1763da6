//! In-memory ledger engine.
//!
//! Accounts live in one map behind a single reader/writer lock. Balance reads
//! take it shared; deposits, withdrawals and transfers take it exclusively for
//! the whole read-modify-write, so checks and mutations never interleave.
//! A transfer touches both accounts under that one acquisition, which rules
//! out lock-ordering deadlocks at the cost of serializing every mutation.
//!
//! Every attempted mutation is audited after the store lock is released,
//! under the audit log's own lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::context::Context;
use crate::model::{Balance, Operation, TransactionRecord, TxKind, TxStatus, Username};
use crate::store::LedgerStore;

mod audit;
pub(crate) use audit::{Attempt, AuditLog};

mod error;
pub use error::{LedgerError, OpenAccountError};

mod health;
pub use health::HealthReport;
pub(crate) use health::HealthMonitor;

mod state;
pub(crate) use state::AccountState;

/// The in-memory ledger.
pub struct Ledger {
    accounts: RwLock<HashMap<Username, AccountState>>,
    audit: AuditLog,
    health: HealthMonitor,
    clock: Arc<dyn Clock>,
}

/// Public API
impl Ledger {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        let ledger = Self {
            accounts: RwLock::new(HashMap::new()),
            audit: AuditLog::new(config.audit_capacity),
            health: HealthMonitor::new(),
            clock,
        };
        info!(
            audit_capacity = ledger.audit.capacity(),
            "ledger initialized"
        );
        ledger
    }

    /// Build a ledger seeded with opening balances.
    pub fn with_accounts<I, U>(config: LedgerConfig, accounts: I) -> Result<Self, OpenAccountError>
    where
        I: IntoIterator<Item = (U, Amount)>,
        U: Into<Username>,
    {
        let ledger = Self::with_config(config);
        for (username, coins) in accounts {
            ledger.open_account(username, coins)?;
        }
        Ok(ledger)
    }

    /// Create an account at version 1. Not audited.
    pub fn open_account(
        &self,
        username: impl Into<Username>,
        coins: Amount,
    ) -> Result<Balance, OpenAccountError> {
        let username = username.into();
        if coins.is_negative() {
            return Err(OpenAccountError::NegativeBalance(username, coins));
        }

        let mut accounts = self.accounts.write();
        if accounts.contains_key(&username) {
            return Err(OpenAccountError::AccountExists(username));
        }
        let state = AccountState::new(coins);
        let balance = state.snapshot(&username);
        accounts.insert(username, state);
        info!(username = %balance.username, coins = %coins, "account opened");
        Ok(balance)
    }

    pub fn balance(&self, username: &str) -> Result<Balance, LedgerError> {
        self.accounts
            .read()
            .get(username)
            .map(|state| state.snapshot(username))
            .ok_or_else(|| LedgerError::UserNotFound(username.to_string()))
    }

    pub fn deposit(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError> {
        let attempt = self.begin(TxKind::Deposit, "", username, amount);
        let result = self.apply_deposit(username, amount);
        self.finish(attempt, &result);
        result
    }

    pub fn withdraw(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError> {
        let attempt = self.begin(TxKind::Withdrawal, username, "", amount);
        let result = self.apply_withdrawal(username, amount);
        self.finish(attempt, &result);
        result
    }

    pub fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(Balance, Balance), LedgerError> {
        self.transfer_with_context(&Context::background(), from, to, amount)
    }

    /// Transfer that first checks `ctx`. The check happens once, before any
    /// work; waiting for the store lock is not interruptible, so a context
    /// that expires while queued for the lock does not stop the transfer.
    pub fn transfer_with_context(
        &self,
        ctx: &Context,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(Balance, Balance), LedgerError> {
        let attempt = self.begin(TxKind::Transfer, from, to, amount);
        let result = self.apply_transfer(ctx, from, to, amount);
        self.finish(attempt, &result);
        result
    }

    /// Audit records naming `username` as sender or recipient, oldest first.
    pub fn history(&self, username: &str) -> Vec<TransactionRecord> {
        self.audit.history(username)
    }

    /// Every retained audit record, oldest first.
    pub fn audit_log(&self) -> Vec<TransactionRecord> {
        self.audit.records()
    }

    pub fn health(&self) -> HealthReport {
        self.health.report(self.clock.now())
    }

    pub fn set_component(&self, name: &str, alive: bool) {
        self.health.set_component(name, alive);
    }

    /// Copies of all accounts, sorted by username.
    pub fn accounts(&self) -> Vec<Balance> {
        let mut balances: Vec<_> = self
            .accounts
            .read()
            .iter()
            .map(|(username, state)| state.snapshot(username))
            .collect();
        balances.sort_by(|a, b| a.username.cmp(&b.username));
        balances
    }

    /// Run the ledger over a stream of operations. Failures are audited and
    /// logged, and do not stop the stream.
    pub async fn run(&self, mut stream: impl Stream<Item = Operation> + Unpin) {
        while let Some(op) = stream.next().await {
            let _ = self.apply(op);
        }
    }

    /// Tear the ledger down, handing back the retained audit trail.
    pub fn shutdown(self) -> Vec<TransactionRecord> {
        let records = self.audit.into_records();
        info!(
            operations = self.health.operation_count(),
            retained = records.len(),
            "ledger shut down"
        );
        records
    }
}

/// Private API
impl Ledger {
    fn begin(&self, kind: TxKind, from: &str, to: &str, amount: Amount) -> Attempt {
        self.health.record_operation();
        Attempt::new(kind, from, to, amount, self.clock.now())
    }

    /// Log the outcome and append the audit record. Must be called with no
    /// store guard alive.
    fn finish<T>(&self, attempt: Attempt, result: &Result<T, LedgerError>) {
        let kind = attempt.kind();
        let status = match result {
            Ok(_) => TxStatus::Success,
            Err(e) => e.audit_status(kind, attempt.sender()),
        };

        match result {
            Ok(_) => {
                info!(
                    from = attempt.sender(),
                    to = attempt.recipient(),
                    amount = %attempt.amount(),
                    "{kind} applied"
                );
            }
            Err(e @ LedgerError::Cancelled(_)) => {
                warn!(
                    from = attempt.sender(),
                    to = attempt.recipient(),
                    amount = %attempt.amount(),
                    reason = %e,
                    "{kind} cancelled"
                );
            }
            Err(e) => {
                info!(
                    from = attempt.sender(),
                    to = attempt.recipient(),
                    amount = %attempt.amount(),
                    status = %status,
                    reason = %e,
                    "{kind} skipped"
                );
            }
        }

        self.audit.append(attempt.finish(status));
    }

    fn ensure_positive(amount: Amount) -> Result<(), LedgerError> {
        if amount.is_positive() {
            Ok(())
        } else {
            Err(LedgerError::InvalidAmount(amount))
        }
    }

    /// Apply a deposit:
    /// - Reject non-positive amounts before locking
    /// - Credit the account and bump its version under the write lock
    fn apply_deposit(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError> {
        Self::ensure_positive(amount)?;

        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| LedgerError::UserNotFound(username.to_string()))?;
        account.credit(username, amount)?;
        Ok(account.snapshot(username))
    }

    /// Apply a withdrawal:
    /// - Reject non-positive amounts before locking
    /// - Check funds and debit in the same write lock acquisition
    fn apply_withdrawal(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError> {
        Self::ensure_positive(amount)?;

        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| LedgerError::UserNotFound(username.to_string()))?;
        account.debit(username, amount)?;
        Ok(account.snapshot(username))
    }

    /// Apply a transfer:
    /// - Check the context, the amount and self-transfer before locking
    /// - Look up both sides and validate the debit and credit on copies
    /// - Publish both new states before the write lock is released
    fn apply_transfer(
        &self,
        ctx: &Context,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(Balance, Balance), LedgerError> {
        if let Some(reason) = ctx.err() {
            return Err(LedgerError::Cancelled(reason));
        }
        Self::ensure_positive(amount)?;
        if from == to {
            return Err(LedgerError::SelfTransferNotAllowed(from.to_string()));
        }

        let mut accounts = self.accounts.write();
        let mut sender = *accounts
            .get(from)
            .ok_or_else(|| LedgerError::UserNotFound(from.to_string()))?;
        let mut recipient = *accounts
            .get(to)
            .ok_or_else(|| LedgerError::UserNotFound(to.to_string()))?;

        sender.debit(from, amount)?;
        recipient.credit(to, amount)?;

        // Both keys were found above under this same guard.
        if let Some(slot) = accounts.get_mut(from) {
            *slot = sender;
        }
        if let Some(slot) = accounts.get_mut(to) {
            *slot = recipient;
        }

        Ok((sender.snapshot(from), recipient.snapshot(to)))
    }
}

impl LedgerStore for Ledger {
    fn balance(&self, username: &str) -> Result<Balance, LedgerError> {
        Ledger::balance(self, username)
    }

    fn deposit(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError> {
        Ledger::deposit(self, username, amount)
    }

    fn withdraw(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError> {
        Ledger::withdraw(self, username, amount)
    }

    fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(Balance, Balance), LedgerError> {
        Ledger::transfer(self, from, to, amount)
    }

    fn transfer_with_context(
        &self,
        ctx: &Context,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(Balance, Balance), LedgerError> {
        Ledger::transfer_with_context(self, ctx, from, to, amount)
    }

    fn history(&self, username: &str) -> Vec<TransactionRecord> {
        Ledger::history(self, username)
    }

    fn health(&self) -> HealthReport {
        Ledger::health(self)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
