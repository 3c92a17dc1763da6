//! Bounded, append-only audit trail of attempted operations.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::RngCore;
use rand::rngs::OsRng;
use std::collections::VecDeque;
use tracing::debug;

use crate::Amount;
use crate::model::{TransactionRecord, TxId, TxKind, TxStatus, Username};

/// Generate an unpredictable transaction ID: 8 bytes from the OS random
/// source, hex-encoded.
pub(crate) fn generate_tx_id() -> TxId {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// An operation that has been invoked but whose outcome is not known yet.
///
/// Captures the ID and timestamp at invocation time; [`Attempt::finish`]
/// seals it into an immutable [`TransactionRecord`].
#[derive(Debug)]
pub(crate) struct Attempt {
    id: TxId,
    kind: TxKind,
    from: Username,
    to: Username,
    amount: Amount,
    timestamp: DateTime<Utc>,
}

impl Attempt {
    pub fn new(kind: TxKind, from: &str, to: &str, amount: Amount, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: generate_tx_id(),
            kind,
            from: from.to_string(),
            to: to.to_string(),
            amount,
            timestamp,
        }
    }

    pub fn kind(&self) -> TxKind {
        self.kind
    }

    pub fn sender(&self) -> &str {
        &self.from
    }

    pub fn recipient(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn finish(self, status: TxStatus) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            kind: self.kind,
            from: self.from,
            to: self.to,
            amount: self.amount,
            timestamp: self.timestamp,
            status,
        }
    }
}

/// Audit log with its own lock, independent of the account store lock.
#[derive(Debug)]
pub(crate) struct AuditLog {
    records: Mutex<VecDeque<TransactionRecord>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting the oldest ones past capacity.
    pub fn append(&self, record: TransactionRecord) {
        let mut records = self.records.lock();
        records.push_back(record);

        let excess = records.len().saturating_sub(self.capacity);
        if excess > 0 {
            records.drain(..excess);
            debug!(evicted = excess, capacity = self.capacity, "audit log trimmed");
        }
    }

    /// Records involving `username` on either side, oldest first.
    pub fn history(&self, username: &str) -> Vec<TransactionRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.involves(username))
            .cloned()
            .collect()
    }

    pub fn records(&self) -> Vec<TransactionRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn into_records(self) -> Vec<TransactionRecord> {
        self.records.into_inner().into()
    }
}
