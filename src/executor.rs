//! `StoreExecutor` - the transaction-capable store contract
//!
//! The engine never talks to a concrete database. Everything a change unit
//! does to its target store goes through this trait, which a storage driver
//! implements once. Two engine-owned implementations exist: the in-memory
//! reference store ([`crate::memory::MemoryStore`]) and the capturing backend
//! used by preview runs ([`crate::capture::CaptureExecutor`]).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use postgres_types::ToSql;

use crate::error::EngineError;

/// Store-level error type
#[derive(Debug)]
pub enum StoreError {
    /// The backing connection cannot be reached
    Unavailable(String),
    /// A statement failed to execute
    Execution(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
            StoreError::Execution(msg) => write!(f, "Statement failed: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Trait for executing schema/data statements against a target store
///
/// Implementations must be safe to share across a whole run: the same
/// executor instance is reused for every unit targeting that store.
pub trait StoreExecutor: Send + Sync {
    /// Execute a statement and return the number of rows affected
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError>;

    /// Whether a table exists in the store
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the check cannot be performed.
    fn has_table(&self, table: &str) -> Result<bool, StoreError>;

    /// Whether a column exists on a table
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the check cannot be performed.
    fn has_column(&self, table: &str, column: &str) -> Result<bool, StoreError>;

    /// Whether this store can run schema changes inside a transaction
    ///
    /// When true and the unit is marked transactional, the runner wraps the
    /// unit's apply() in begin/commit, rolling back on failure.
    fn supports_ddl_transactions(&self) -> bool;

    /// Open a transaction
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the transaction cannot be started.
    fn begin(&self) -> Result<(), StoreError> {
        self.execute("BEGIN", &[]).map(|_| ())
    }

    /// Commit the open transaction
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the commit fails.
    fn commit(&self) -> Result<(), StoreError> {
        self.execute("COMMIT", &[]).map(|_| ())
    }

    /// Roll back the open transaction
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the rollback fails.
    fn rollback(&self) -> Result<(), StoreError> {
        self.execute("ROLLBACK", &[]).map(|_| ())
    }
}

/// Resolves a target-store name to an executor
///
/// `None` means "the engine default". Wiring layers hand the runner one of
/// these instead of the runner locating connections ambiently.
pub trait StoreProvider {
    /// Resolve a store name to an executor
    ///
    /// # Errors
    ///
    /// Returns `EngineError::StoreUnavailable` if the name is unknown.
    fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn StoreExecutor>, EngineError>;
}

/// Default `StoreProvider`: one default executor plus named overrides
pub struct StoreRegistry {
    default: Arc<dyn StoreExecutor>,
    named: HashMap<String, Arc<dyn StoreExecutor>>,
}

impl StoreRegistry {
    /// Create a registry with only a default store
    pub fn new(default: Arc<dyn StoreExecutor>) -> Self {
        Self {
            default,
            named: HashMap::new(),
        }
    }

    /// Add a named store that units can select via `target_store()`
    #[must_use]
    pub fn with_store(mut self, name: impl Into<String>, store: Arc<dyn StoreExecutor>) -> Self {
        self.named.insert(name.into(), store);
        self
    }
}

impl StoreProvider for StoreRegistry {
    fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn StoreExecutor>, EngineError> {
        match name {
            None => Ok(Arc::clone(&self.default)),
            Some(name) => self
                .named
                .get(name)
                .cloned()
                .ok_or_else(|| EngineError::StoreUnavailable(format!("unknown target store '{name}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Execution("syntax error".to_string());
        assert!(err.to_string().contains("Statement failed"));

        let err = StoreError::Unavailable("connection refused".to_string());
        assert!(err.to_string().contains("Store unavailable"));
    }

    #[test]
    fn test_registry_resolves_default_for_none() {
        let registry = StoreRegistry::new(Arc::new(MemoryStore::new()));
        assert!(registry.resolve(None).is_ok());
    }

    #[test]
    fn test_registry_rejects_unknown_name() {
        let registry = StoreRegistry::new(Arc::new(MemoryStore::new()));
        let err = registry.resolve(Some("analytics")).err();
        match err {
            Some(EngineError::StoreUnavailable(msg)) => assert!(msg.contains("analytics")),
            other => panic!("Expected StoreUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_resolves_named_store() {
        let registry = StoreRegistry::new(Arc::new(MemoryStore::new()))
            .with_store("analytics", Arc::new(MemoryStore::new()));
        assert!(registry.resolve(Some("analytics")).is_ok());
    }
}
