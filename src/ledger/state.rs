use crate::Amount;
use crate::ledger::LedgerError;
use crate::model::Balance;

/// Authoritative state of one account inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AccountState {
    coins: Amount,
    version: u64,
}

impl AccountState {
    pub fn new(coins: Amount) -> Self {
        Self { coins, version: 1 }
    }

    /// Add `amount` and bump the version. On overflow nothing changes.
    pub fn credit(&mut self, username: &str, amount: Amount) -> Result<(), LedgerError> {
        self.coins = self
            .coins
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(username.to_string()))?;
        self.version += 1;
        Ok(())
    }

    /// Remove `amount` and bump the version. Never drives the balance below zero.
    pub fn debit(&mut self, username: &str, amount: Amount) -> Result<(), LedgerError> {
        if amount > self.coins {
            return Err(LedgerError::InsufficientFunds {
                username: username.to_string(),
                available: self.coins,
                requested: amount,
            });
        }
        self.coins = self
            .coins
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::Overflow(username.to_string()))?;
        self.version += 1;
        Ok(())
    }

    pub fn snapshot(&self, username: &str) -> Balance {
        Balance {
            username: username.to_string(),
            coins: self.coins,
            version: self.version,
        }
    }
}
