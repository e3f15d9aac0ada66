//! `ChangeUnit` trait definition

use crate::executor::StoreError;
use crate::schema_manager::SchemaManager;

/// Trait that all change units must implement
///
/// Each unit source file defines one struct implementing this trait. A unit
/// is constructed by the registry at run time and is stateless: only its
/// identifier and batch number are ever persisted.
///
/// Units must be idempotent or transactional: if the process crashes between
/// a unit's `apply()` and the ledger write that follows, the unit is still
/// marked not-applied and will be retried on the next run.
pub trait ChangeUnit: Send + Sync {
    /// Canonical identifier, derived from the source file name
    ///
    /// Shape: `<date_prefix>_<snake_case_descriptor>`, for example
    /// `2024_01_01_000000_create_accounts`. Globally unique within a ledger;
    /// the lexicographic order of identifiers is the application order.
    fn identifier(&self) -> &str;

    /// Which backing store this unit applies to
    ///
    /// `None` means the engine's configured default store.
    fn target_store(&self) -> Option<&str> {
        None
    }

    /// Whether this unit may run inside a transaction
    ///
    /// Defaults to true. Only honored when the target store supports
    /// transactional schema changes; otherwise the unit runs bare.
    fn transactional(&self) -> bool {
        true
    }

    /// Apply the unit's schema or data changes
    ///
    /// Runs exactly once per ledger. In preview mode the same code runs
    /// against a capturing store, so `apply()` must route every operation
    /// through the given [`SchemaManager`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError` on failure; the run aborts at this unit and the
    /// unit is not recorded.
    fn apply(&self, schema: &SchemaManager<'_>) -> Result<(), StoreError>;
}

impl std::fmt::Debug for dyn ChangeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeUnit")
            .field("identifier", &self.identifier())
            .finish()
    }
}
