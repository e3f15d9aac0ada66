//! Capturing executor for preview runs
//!
//! Preview ("pretend") mode runs a unit's real `apply()` code path against a
//! store backend that records every statement instead of sending it. The
//! backend is selected per run; unit code never sees a pretend flag.
//!
//! Existence-check policy: capture mode answers **every** `has_table` /
//! `has_column` query with `false`. A unit that guards work behind "unless it
//! already exists" therefore always captures that work, which makes the
//! preview a deterministic superset of a real run and keeps branch traversal
//! reproducible between preview and execution.

use std::fmt;
use std::sync::Mutex;

use postgres_types::ToSql;

use crate::executor::{StoreError, StoreExecutor};

/// One statement a unit would have executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedStatement {
    /// The statement text as it would be sent to the store
    pub sql: String,
    /// Number of bind parameters the statement carried
    pub params: usize,
}

impl fmt::Display for CapturedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params == 0 {
            write!(f, "{}", self.sql)
        } else {
            write!(f, "{} [{} bind parameter(s)]", self.sql, self.params)
        }
    }
}

/// `StoreExecutor` backend that records statements instead of executing them
pub struct CaptureExecutor {
    statements: Mutex<Vec<CapturedStatement>>,
}

impl CaptureExecutor {
    /// Create an empty capture backend
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
        }
    }

    /// The statements captured so far, in execution order
    pub fn statements(&self) -> Vec<CapturedStatement> {
        self.statements
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Consume the backend and return the captured statements
    pub fn into_statements(self) -> Vec<CapturedStatement> {
        self.statements
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for CaptureExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreExecutor for CaptureExecutor {
    fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        self.statements
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(CapturedStatement {
                sql: sql.to_string(),
                params: params.len(),
            });
        Ok(0)
    }

    // Fixed preview policy: nothing exists. See module docs.
    fn has_table(&self, _table: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn has_column(&self, _table: &str, _column: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn supports_ddl_transactions(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_in_order() {
        let capture = CaptureExecutor::new();
        capture.execute("CREATE TABLE x (id INT)", &[]).unwrap();
        capture.execute("DROP TABLE y", &[]).unwrap();

        let statements = capture.into_statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql, "CREATE TABLE x (id INT)");
        assert_eq!(statements[1].sql, "DROP TABLE y");
    }

    #[test]
    fn test_existence_checks_report_false() {
        let capture = CaptureExecutor::new();
        assert!(!capture.has_table("anything").unwrap());
        assert!(!capture.has_column("anything", "at_all").unwrap());
        // Checks are answered, never captured
        assert!(capture.statements().is_empty());
    }

    #[test]
    fn test_display_mentions_bind_parameters() {
        let with_params = CapturedStatement {
            sql: "INSERT INTO t VALUES ($1)".to_string(),
            params: 1,
        };
        assert!(with_params.to_string().contains("1 bind parameter"));

        let without = CapturedStatement {
            sql: "DROP TABLE t".to_string(),
            params: 0,
        };
        assert_eq!(without.to_string(), "DROP TABLE t");
    }
}
