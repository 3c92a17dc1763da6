use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::{Amount, Balance, Operation, Username};

/// Errors that can occur when reading or writing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized operation type '{op_type}'")]
    UnrecognizedType { line: usize, op_type: String },

    #[error("line {line}: {op_type} missing amount")]
    MissingAmount { line: usize, op_type: String },

    #[error("line {line}: {op_type} missing '{field}' account")]
    MissingAccount {
        line: usize,
        op_type: String,
        field: &'static str,
    },

    #[error("failed to write output: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush output: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    username: Username,
    coins: i64,
}

#[derive(Debug, Deserialize)]
struct OperationRow {
    r#type: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    amount: Option<i64>,
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    username: &'a str,
    coins: i64,
    version: u64,
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, CsvError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// Read opening balances (`username,coins`) from a csv file
pub fn read_accounts(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<(Username, Amount), CsvError>>, CsvError> {
    let reader = reader(path.as_ref())?;

    Ok(reader
        .into_deserialize::<AccountRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            Ok((row.username, Amount::new(row.coins)))
        }))
}

/// Read operations (`type,from,to,amount`) from a csv file
pub fn read_operations(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Operation, CsvError>>, CsvError> {
    let reader = reader(path.as_ref())?;

    Ok(reader
        .into_deserialize::<OperationRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_operation(line, row)
        }))
}

fn parse_operation(line: usize, row: OperationRow) -> Result<Operation, CsvError> {
    let op_type = row.r#type.as_str();
    let require = |value: String, field: &'static str| {
        if value.is_empty() {
            Err(CsvError::MissingAccount {
                line,
                op_type: op_type.to_string(),
                field,
            })
        } else {
            Ok(value)
        }
    };

    if !matches!(op_type, "deposit" | "withdrawal" | "transfer") {
        return Err(CsvError::UnrecognizedType {
            line,
            op_type: op_type.to_string(),
        });
    }
    let amount = row
        .amount
        .map(Amount::new)
        .ok_or_else(|| CsvError::MissingAmount {
            line,
            op_type: op_type.to_string(),
        })?;

    match op_type {
        "deposit" => Ok(Operation::Deposit {
            username: require(row.to, "to")?,
            amount,
        }),
        "withdrawal" => Ok(Operation::Withdraw {
            username: require(row.from, "from")?,
            amount,
        }),
        _ => Ok(Operation::Transfer {
            from: require(row.from, "from")?,
            to: require(row.to, "to")?,
            amount,
        }),
    }
}

/// Write account balances in csv format
pub fn write_balances<'a, W: io::Write>(
    writer: W,
    balances: impl IntoIterator<Item = &'a Balance>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for balance in balances {
        writer.serialize(BalanceRow {
            username: &balance.username,
            coins: balance.coins.coins(),
            version: balance.version,
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn operations(content: &str) -> Vec<Result<Operation, CsvError>> {
        let file = write_csv(content);
        read_operations(file.path()).unwrap().collect()
    }

    #[test]
    fn read_accounts_rows() {
        let file = write_csv("username,coins\naaron,300\n bryan , 200\n");
        let accounts: Vec<_> = read_accounts(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            accounts,
            vec![
                ("aaron".to_string(), Amount::new(300)),
                ("bryan".to_string(), Amount::new(200)),
            ]
        );
    }

    #[test]
    fn read_accounts_missing_file() {
        let err = read_accounts("/nonexistent/accounts.csv").err().unwrap();
        assert!(matches!(err, CsvError::Open { .. }));
    }

    #[test]
    fn read_deposit() {
        let results = operations("type,from,to,amount\ndeposit,,aaron,10\n");
        assert_eq!(results.len(), 1);
        match results.into_iter().next().unwrap().unwrap() {
            Operation::Deposit { username, amount } => {
                assert_eq!(username, "aaron");
                assert_eq!(amount, Amount::new(10));
            }
            other => panic!("expected deposit, got {other:?}"),
        }
    }

    #[test]
    fn read_withdrawal_and_transfer() {
        let results = operations(
            "type, from, to, amount\nwithdrawal, aaron, , 5\ntransfer, aaron, bryan, 7\n",
        );
        let ops: Vec<_> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            ops,
            vec![
                Operation::Withdraw {
                    username: "aaron".to_string(),
                    amount: Amount::new(5),
                },
                Operation::Transfer {
                    from: "aaron".to_string(),
                    to: "bryan".to_string(),
                    amount: Amount::new(7),
                },
            ]
        );
    }

    #[test]
    fn non_positive_amounts_are_passed_through() {
        // the ledger rejects and audits these, not the reader
        let results = operations("type,from,to,amount\ndeposit,,aaron,-3\n");
        assert!(matches!(
            results[0],
            Ok(Operation::Deposit { amount, .. }) if amount == Amount::new(-3)
        ));
    }

    #[test]
    fn read_returns_error_for_unknown_type() {
        let results = operations("type,from,to,amount\nrefund,aaron,,10\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::UnrecognizedType { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_amount() {
        let results = operations("type,from,to,amount\ndeposit,,aaron,\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::MissingAmount { line: 2, .. }));
    }

    #[test]
    fn read_returns_error_for_missing_account() {
        let results = operations("type,from,to,amount\ntransfer,aaron,,10\n");
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            CsvError::MissingAccount {
                line: 2,
                field: "to",
                ..
            }
        ));
    }

    #[test]
    fn write_balances_rows() {
        let balances = vec![
            Balance {
                username: "aaron".to_string(),
                coins: Amount::new(250),
                version: 3,
            },
            Balance {
                username: "bryan".to_string(),
                coins: Amount::new(0),
                version: 1,
            },
        ];
        let mut out = Vec::new();
        write_balances(&mut out, &balances).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "username,coins,version\naaron,250,3\nbryan,0,1\n"
        );
    }
}
