use std::{env, io, process};

use coin_ledger::csv::{read_accounts, read_operations, write_balances};
use coin_ledger::{Ledger, LedgerConfig};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(accounts_path), Some(operations_path)) = (args.next(), args.next()) else {
        eprintln!("usage: coin-ledger <accounts.csv> <operations.csv>");
        process::exit(2);
    };

    let config = match LedgerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(2);
        }
    };

    let accounts = match read_accounts(&accounts_path) {
        Ok(rows) => rows.filter_map(|row| row.map_err(|e| warn!("{e}")).ok()),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    let ledger = Ledger::with_config(config);
    for (username, coins) in accounts {
        if let Err(e) = ledger.open_account(username, coins) {
            warn!("{e}");
        }
    }

    let operations = match read_operations(operations_path) {
        Ok(rows) => rows,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    let (op_sender, op_receiver) = tokio::sync::mpsc::channel(16);

    let reader = tokio::spawn(async move {
        for result in operations {
            match result {
                Ok(op) => {
                    if op_sender.send(op).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(op_receiver)).await;
    if let Err(e) = reader.await {
        error!("operation reader failed: {e}");
    }

    if let Err(e) = write_balances(io::stdout().lock(), &ledger.accounts()) {
        error!("{e}");
        process::exit(1);
    }

    let health = ledger.health();
    let records = ledger.shutdown();
    info!(
        operations = health.operation_count,
        audited = records.len(),
        "replay finished"
    );
}
