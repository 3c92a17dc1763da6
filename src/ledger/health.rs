//! Advisory health introspection.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Components reported live when a ledger is constructed. `database` is the
/// account store.
pub(crate) const DEFAULT_COMPONENTS: [&str; 3] = ["database", "audit_log", "performance"];

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Always `"healthy"`; liveness detail lives in `components`.
    pub status: &'static str,
    pub uptime: Duration,
    pub operation_count: u64,
    pub components: BTreeMap<String, bool>,
    pub last_check: DateTime<Utc>,
    pub version: &'static str,
}

#[derive(Debug)]
pub(crate) struct HealthMonitor {
    started: Instant,
    operations: AtomicU64,
    components: RwLock<BTreeMap<String, bool>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            operations: AtomicU64::new(0),
            components: RwLock::new(
                DEFAULT_COMPONENTS
                    .iter()
                    .map(|name| (name.to_string(), true))
                    .collect(),
            ),
        }
    }

    pub fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    pub fn set_component(&self, name: &str, alive: bool) {
        self.components.write().insert(name.to_string(), alive);
    }

    pub fn report(&self, now: DateTime<Utc>) -> HealthReport {
        HealthReport {
            status: "healthy",
            uptime: self.started.elapsed(),
            operation_count: self.operation_count(),
            components: self.components.read().clone(),
            last_check: now,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
