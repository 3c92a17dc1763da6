//! Capability set every ledger backend provides.

use crate::Amount;
use crate::context::Context;
use crate::ledger::{HealthReport, LedgerError};
use crate::model::{Balance, Operation, Outcome, TransactionRecord};

/// Balance lookup, the three audited mutations, history and health.
///
/// [`Ledger`](crate::Ledger) is the in-memory implementation. Callers that
/// only depend on this trait keep working against any other backend.
pub trait LedgerStore: Send + Sync {
    fn balance(&self, username: &str) -> Result<Balance, LedgerError>;

    fn deposit(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError>;

    fn withdraw(&self, username: &str, amount: Amount) -> Result<Balance, LedgerError>;

    fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(Balance, Balance), LedgerError>;

    fn transfer_with_context(
        &self,
        ctx: &Context,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<(Balance, Balance), LedgerError>;

    fn history(&self, username: &str) -> Vec<TransactionRecord>;

    fn health(&self) -> HealthReport;

    /// Dispatch a single [`Operation`].
    fn apply(&self, op: Operation) -> Result<Outcome, LedgerError> {
        match op {
            Operation::Deposit { username, amount } => {
                self.deposit(&username, amount).map(Outcome::Balance)
            }
            Operation::Withdraw { username, amount } => {
                self.withdraw(&username, amount).map(Outcome::Balance)
            }
            Operation::Transfer { from, to, amount } => self
                .transfer(&from, &to, amount)
                .map(|(from, to)| Outcome::Transfer { from, to }),
        }
    }
}
