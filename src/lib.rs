pub mod amount;
pub mod clock;
pub mod config;
pub mod context;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod store;

pub use amount::Amount;
pub use config::LedgerConfig;
pub use context::{CancelReason, Context};
pub use ledger::{Ledger, LedgerError, OpenAccountError};
pub use model::{Balance, Operation, Outcome, TransactionRecord, TxKind, TxStatus, Username};
pub use store::LedgerStore;
