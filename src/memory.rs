//! In-memory reference store
//!
//! `MemoryStore` journals every executed statement instead of applying it to
//! a real database. It backs the engine's own tests and the reference CLI
//! wiring; real deployments implement [`StoreExecutor`] over their driver.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use postgres_types::ToSql;

use crate::executor::{StoreError, StoreExecutor};

#[derive(Default)]
struct MemoryStoreInner {
    journal: Vec<String>,
    tables: HashMap<String, HashSet<String>>,
}

/// Statement-journaling store with declarable schema state
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
    transactional_ddl: bool,
}

impl MemoryStore {
    /// Create a store that reports transactional DDL support
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner::default()),
            transactional_ddl: true,
        }
    }

    /// Create a store that does not support transactional DDL
    pub fn non_transactional() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner::default()),
            transactional_ddl: false,
        }
    }

    /// Declare a table (and its columns) as existing
    ///
    /// Existence checks answer from this declared state; executed statements
    /// are journaled, not interpreted.
    #[must_use]
    pub fn with_table(self, table: impl Into<String>, columns: &[&str]) -> Self {
        {
            let mut inner = self.lock();
            inner.tables.insert(
                table.into(),
                columns.iter().map(|c| (*c).to_string()).collect(),
            );
        }
        self
    }

    /// Every statement executed so far, in order
    pub fn journal(&self) -> Vec<String> {
        self.lock().journal.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        // Journal poisoning only happens if a test panicked mid-write
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreExecutor for MemoryStore {
    fn execute(&self, sql: &str, _params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        self.lock().journal.push(sql.to_string());
        Ok(0)
    }

    fn has_table(&self, table: &str) -> Result<bool, StoreError> {
        Ok(self.lock().tables.contains_key(table))
    }

    fn has_column(&self, table: &str, column: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .tables
            .get(table)
            .is_some_and(|cols| cols.contains(column)))
    }

    fn supports_ddl_transactions(&self) -> bool {
        self.transactional_ddl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_preserves_order() {
        let store = MemoryStore::new();
        store.execute("CREATE TABLE a (id INT)", &[]).unwrap();
        store.execute("CREATE TABLE b (id INT)", &[]).unwrap();

        assert_eq!(
            store.journal(),
            vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]
        );
    }

    #[test]
    fn test_declared_tables_answer_existence_checks() {
        let store = MemoryStore::new().with_table("users", &["id", "email"]);

        assert!(store.has_table("users").unwrap());
        assert!(store.has_column("users", "email").unwrap());
        assert!(!store.has_column("users", "avatar_url").unwrap());
        assert!(!store.has_table("orders").unwrap());
    }

    #[test]
    fn test_transaction_statements_are_journaled() {
        let store = MemoryStore::new();
        store.begin().unwrap();
        store.execute("CREATE TABLE a (id INT)", &[]).unwrap();
        store.commit().unwrap();

        assert_eq!(
            store.journal(),
            vec!["BEGIN", "CREATE TABLE a (id INT)", "COMMIT"]
        );
    }

    #[test]
    fn test_transactional_ddl_flag() {
        assert!(MemoryStore::new().supports_ddl_transactions());
        assert!(!MemoryStore::non_transactional().supports_ddl_transactions());
    }
}
