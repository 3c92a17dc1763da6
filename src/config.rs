//! Ledger configuration.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Environment variable overriding [`LedgerConfig::audit_capacity`].
pub const AUDIT_CAPACITY_ENV: &str = "LEDGER_AUDIT_CAPACITY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: expected a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum number of audit records retained; oldest are evicted first.
    pub audit_capacity: usize,
}

impl LedgerConfig {
    pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(AUDIT_CAPACITY_ENV) {
            let parsed = value.trim().parse::<usize>();
            config.audit_capacity = match parsed {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: AUDIT_CAPACITY_ENV,
                        value,
                    });
                }
            };
        }
        Ok(config)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            audit_capacity: Self::DEFAULT_AUDIT_CAPACITY,
        }
    }
}
