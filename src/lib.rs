//! # Seawall
//!
//! Deterministic change-unit orchestration: apply an ordered set of
//! idempotent schema/data updates against a persistent store exactly once,
//! with batch grouping for auditability and a non-mutating preview mode.
//!
//! The engine sees storage only through two narrow contracts: the
//! [`Ledger`] (which units have been applied, in which batch) and the
//! [`StoreExecutor`] (statement execution with optional transactional DDL).
//! Concrete drivers, CLI flag parsing, and service wiring live outside.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use seawall::{MemoryLedger, MemoryStore, Runner, RunOptions, StoreRegistry, UnitRegistry};
//!
//! # fn main() -> Result<(), seawall::EngineError> {
//! let ledger = MemoryLedger::new();
//! let registry = UnitRegistry::new(); // register compiled units here
//! let stores = StoreRegistry::new(Arc::new(MemoryStore::new()));
//!
//! let runner = Runner::new(&ledger, &registry, &stores);
//! runner.create_ledger_if_missing()?;
//! let applied = runner.run(&["updates"], RunOptions::default())?;
//! println!("applied {} unit(s)", applied.len());
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod executor;
pub mod ledger;
pub mod memory;
pub mod registry;
pub mod runner;
pub mod scaffold;
pub mod schema_manager;
pub mod unit;

pub use capture::{CaptureExecutor, CapturedStatement};
pub use config::EngineConfig;
pub use discovery::{discover_units, UnitSource, UNIT_FILE_SUFFIX};
pub use error::EngineError;
pub use events::{EventSink, LogNotes, NoopEvents, NoopNotes, NoteSink, RunEvent};
pub use executor::{StoreError, StoreExecutor, StoreProvider, StoreRegistry};
pub use ledger::{Ledger, LedgerEntry, MemoryLedger};
pub use memory::MemoryStore;
pub use registry::{UnitFactory, UnitRegistry};
pub use runner::{RunOptions, Runner};
pub use scaffold::scaffold_unit;
pub use schema_manager::SchemaManager;
pub use unit::ChangeUnit;
