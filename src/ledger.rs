//! Ledger contract and in-memory reference implementation
//!
//! The ledger is the durable record of which change units have been applied
//! and in which batch. One row per applied unit; entries are append-only and
//! never updated. Storage drivers implement [`Ledger`] over their own
//! connection; [`MemoryLedger`] is the engine-owned reference implementation.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::EngineError;

/// A persisted fact: "unit X was applied in batch N at time T"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Change-unit identifier
    pub identifier: String,
    /// Batch number, positive and monotonically non-decreasing across runs
    pub batch: i64,
    /// When the unit was applied
    pub applied_at: DateTime<Utc>,
}

/// Durable record of applied change units
///
/// The engine guarantees at most one entry per identifier: entries are
/// created only after a unit's `apply()` returns without error, never before.
/// The engine provides no cross-process mutual exclusion over the ledger;
/// callers running multiple processes against one ledger must lock externally.
pub trait Ledger {
    /// Identifiers of all applied units
    ///
    /// # Errors
    ///
    /// Returns `EngineError::StoreUnavailable` if the backing connection
    /// cannot be reached.
    fn list_applied(&self) -> Result<HashSet<String>, EngineError>;

    /// Next batch number: 1 + max(batch) over all entries, or 1 if empty
    ///
    /// # Errors
    ///
    /// Returns `EngineError::StoreUnavailable` if the backing connection
    /// cannot be reached.
    fn next_batch_number(&self) -> Result<i64, EngineError>;

    /// Insert one entry
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DuplicateUnit` if an entry already exists for
    /// the identifier. The runner never records an already-applied unit, so
    /// this firing indicates an orchestration invariant violation.
    fn record(
        &self,
        identifier: &str,
        batch: i64,
        applied_at: DateTime<Utc>,
    ) -> Result<(), EngineError>;

    /// Whether the ledger's backing structure has been provisioned
    ///
    /// # Errors
    ///
    /// Returns `EngineError::StoreUnavailable` if the backing connection
    /// cannot be reached.
    fn exists(&self) -> Result<bool, EngineError>;

    /// Provision the backing structure
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AlreadyInitialized` if already provisioned, or
    /// `EngineError::ProvisioningFailed` on a lower-level store error.
    fn initialize(&self) -> Result<(), EngineError>;

    /// Select which physical store subsequent operations address
    ///
    /// `None` means the engine default.
    fn set_target_store(&self, name: Option<&str>);
}

#[derive(Default)]
struct MemoryLedgerInner {
    provisioned: bool,
    entries: Vec<LedgerEntry>,
    target_store: Option<String>,
}

/// In-memory reference `Ledger`
///
/// Starts unprovisioned; call [`Ledger::initialize`] (or the runner's
/// `create_ledger_if_missing`) before use, as a driver-backed ledger would
/// require.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<MemoryLedgerInner>,
}

impl MemoryLedger {
    /// Create an unprovisioned ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger that is already provisioned
    pub fn provisioned() -> Self {
        let ledger = Self::new();
        ledger.lock().provisioned = true;
        ledger
    }

    /// All entries, in insertion order
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().entries.clone()
    }

    /// The currently selected target store, if any
    pub fn target_store(&self) -> Option<String> {
        self.lock().target_store.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryLedgerInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_provisioned(inner: &MemoryLedgerInner) -> Result<(), EngineError> {
        if inner.provisioned {
            Ok(())
        } else {
            Err(EngineError::StoreUnavailable(
                "ledger has not been initialized".to_string(),
            ))
        }
    }
}

impl Ledger for MemoryLedger {
    fn list_applied(&self) -> Result<HashSet<String>, EngineError> {
        let inner = self.lock();
        Self::check_provisioned(&inner)?;
        Ok(inner
            .entries
            .iter()
            .map(|e| e.identifier.clone())
            .collect())
    }

    fn next_batch_number(&self) -> Result<i64, EngineError> {
        let inner = self.lock();
        Self::check_provisioned(&inner)?;
        let max = inner.entries.iter().map(|e| e.batch).max().unwrap_or(0);
        Ok(max + 1)
    }

    fn record(
        &self,
        identifier: &str,
        batch: i64,
        applied_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let mut inner = self.lock();
        Self::check_provisioned(&inner)?;

        if inner.entries.iter().any(|e| e.identifier == identifier) {
            return Err(EngineError::DuplicateUnit {
                identifier: identifier.to_string(),
            });
        }

        inner.entries.push(LedgerEntry {
            identifier: identifier.to_string(),
            batch,
            applied_at,
        });
        Ok(())
    }

    fn exists(&self) -> Result<bool, EngineError> {
        Ok(self.lock().provisioned)
    }

    fn initialize(&self) -> Result<(), EngineError> {
        let mut inner = self.lock();
        if inner.provisioned {
            return Err(EngineError::AlreadyInitialized);
        }
        inner.provisioned = true;
        Ok(())
    }

    fn set_target_store(&self, name: Option<&str>) {
        self.lock().target_store = name.map(String::from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unprovisioned_ledger_is_unavailable() {
        let ledger = MemoryLedger::new();
        assert!(!ledger.exists().unwrap());

        match ledger.list_applied() {
            Err(EngineError::StoreUnavailable(_)) => {}
            other => panic!("Expected StoreUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_initialize_once() {
        let ledger = MemoryLedger::new();
        ledger.initialize().unwrap();
        assert!(ledger.exists().unwrap());

        match ledger.initialize() {
            Err(EngineError::AlreadyInitialized) => {}
            other => panic!("Expected AlreadyInitialized, got {other:?}"),
        }
    }

    #[test]
    fn test_next_batch_number() {
        let ledger = MemoryLedger::provisioned();
        assert_eq!(ledger.next_batch_number().unwrap(), 1);

        ledger
            .record("2024_01_01_000000_create_x", 1, Utc::now())
            .unwrap();
        ledger
            .record("2024_01_02_000000_create_y", 3, Utc::now())
            .unwrap();
        assert_eq!(ledger.next_batch_number().unwrap(), 4);
    }

    #[test]
    fn test_record_rejects_duplicate() {
        let ledger = MemoryLedger::provisioned();
        ledger
            .record("2024_01_01_000000_create_x", 1, Utc::now())
            .unwrap();

        match ledger.record("2024_01_01_000000_create_x", 2, Utc::now()) {
            Err(EngineError::DuplicateUnit { identifier }) => {
                assert_eq!(identifier, "2024_01_01_000000_create_x");
            }
            other => panic!("Expected DuplicateUnit, got {other:?}"),
        }
        // Append-only: the original entry is untouched
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].batch, 1);
    }

    #[test]
    fn test_list_applied() {
        let ledger = MemoryLedger::provisioned();
        ledger
            .record("2024_01_01_000000_create_x", 1, Utc::now())
            .unwrap();

        let applied = ledger.list_applied().unwrap();
        assert!(applied.contains("2024_01_01_000000_create_x"));
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn test_set_target_store() {
        let ledger = MemoryLedger::provisioned();
        assert_eq!(ledger.target_store(), None);

        ledger.set_target_store(Some("analytics"));
        assert_eq!(ledger.target_store(), Some("analytics".to_string()));

        ledger.set_target_store(None);
        assert_eq!(ledger.target_store(), None);
    }
}
