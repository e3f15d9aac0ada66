//! `SchemaManager` - schema operations available to change units

use postgres_types::ToSql;
use sea_query::{
    ColumnDef, IndexCreateStatement, IndexDropStatement, Table, TableAlterStatement,
    TableCreateStatement, TableDropStatement,
};
use std::fmt::Display;

use crate::executor::{StoreError, StoreExecutor};

/// `SchemaManager` provides methods for performing schema operations in change units
///
/// This struct borrows a [`StoreExecutor`] and provides convenient methods for
/// common schema operations like creating tables, adding columns, and creating
/// indexes. The same unit code runs against the real store or, in preview
/// mode, against the capturing backend.
pub struct SchemaManager<'a> {
    executor: &'a dyn StoreExecutor,
}

impl<'a> SchemaManager<'a> {
    /// Create a new `SchemaManager` over the given executor
    pub fn new(executor: &'a dyn StoreExecutor) -> Self {
        Self { executor }
    }

    /// Create a table
    ///
    /// # Example
    /// ```rust,no_run
    /// use sea_query::{Table, ColumnDef};
    ///
    /// # fn example(schema: &seawall::SchemaManager<'_>) -> Result<(), seawall::StoreError> {
    /// let table = Table::create()
    ///     .table("users")
    ///     .col(ColumnDef::new("id").integer().not_null().auto_increment().primary_key())
    ///     .col(ColumnDef::new("email").string().not_null().unique_key())
    ///     .to_owned();
    ///
    /// schema.create_table(table)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn create_table(&self, table: TableCreateStatement) -> Result<(), StoreError> {
        let builder = sea_query::PostgresQueryBuilder;
        let sql = table.build(builder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Drop a table
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn drop_table(&self, table: TableDropStatement) -> Result<(), StoreError> {
        let builder = sea_query::PostgresQueryBuilder;
        let sql = table.build(builder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Alter a table
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn alter_table(&self, alter: TableAlterStatement) -> Result<(), StoreError> {
        let builder = sea_query::PostgresQueryBuilder;
        let sql = alter.build(builder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Create an index
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn create_index(&self, index: IndexCreateStatement) -> Result<(), StoreError> {
        let builder = sea_query::PostgresQueryBuilder;
        let sql = index.build(builder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Drop an index
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn drop_index(&self, index: IndexDropStatement) -> Result<(), StoreError> {
        let builder = sea_query::PostgresQueryBuilder;
        let sql = index.build(builder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Add a column to an existing table
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn add_column<T: Display>(&self, table: T, column: ColumnDef) -> Result<(), StoreError> {
        let alter = Table::alter()
            .table(table.to_string())
            .add_column(column)
            .to_owned();
        self.alter_table(alter)
    }

    /// Drop a column from an existing table
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn drop_column<T: Display>(&self, table: T, column: &str) -> Result<(), StoreError> {
        let alter = Table::alter()
            .table(table.to_string())
            .drop_column(column.to_string())
            .to_owned();
        self.alter_table(alter)
    }

    /// Execute raw SQL
    ///
    /// # Example
    /// ```rust,no_run
    /// # fn example(schema: &seawall::SchemaManager<'_>) -> Result<(), seawall::StoreError> {
    /// schema.execute("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\"", &[])?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the statement fails.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<(), StoreError> {
        self.executor.execute(sql, params).map(|_| ())
    }

    /// Whether a table exists in the target store
    ///
    /// In preview mode this always answers `false`; see
    /// [`crate::capture::CaptureExecutor`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the check cannot be performed.
    pub fn has_table(&self, table: &str) -> Result<bool, StoreError> {
        self.executor.has_table(table)
    }

    /// Whether a column exists on a table in the target store
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the check cannot be performed.
    pub fn has_column(&self, table: &str, column: &str) -> Result<bool, StoreError> {
        self.executor.has_column(table, column)
    }

    /// Get a reference to the underlying executor
    pub fn executor(&self) -> &dyn StoreExecutor {
        self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use sea_query::{ColumnDef, Table};

    #[test]
    fn test_create_table_builds_and_executes() {
        let store = MemoryStore::new();
        let schema = SchemaManager::new(&store);

        let table = Table::create()
            .table("users")
            .col(ColumnDef::new("id").integer().not_null().primary_key())
            .to_owned();
        schema.create_table(table).unwrap();

        let journal = store.journal();
        assert_eq!(journal.len(), 1);
        assert!(journal[0].contains("CREATE TABLE"));
        assert!(journal[0].contains("users"));
    }

    #[test]
    fn test_drop_column_emits_alter() {
        let store = MemoryStore::new();
        let schema = SchemaManager::new(&store);

        schema.drop_column("users", "avatar_url").unwrap();

        let journal = store.journal();
        assert!(journal[0].contains("ALTER TABLE"));
        assert!(journal[0].contains("avatar_url"));
    }

    #[test]
    fn test_existence_checks_pass_through() {
        let store = MemoryStore::new().with_table("users", &["id"]);
        let schema = SchemaManager::new(&store);

        assert!(schema.has_table("users").unwrap());
        assert!(!schema.has_column("users", "email").unwrap());
    }
}
