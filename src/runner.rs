//! Runner - core change-unit execution engine

use std::path::Path;
use std::time::Instant;

use chrono::Utc;

use crate::capture::{CaptureExecutor, CapturedStatement};
use crate::discovery::{discover_units, UnitSource};
use crate::error::EngineError;
use crate::events::{EventSink, NoopEvents, NoopNotes, NoteSink, RunEvent};
use crate::executor::{StoreError, StoreExecutor, StoreProvider};
use crate::ledger::Ledger;
use crate::registry::UnitRegistry;
use crate::schema_manager::SchemaManager;
use crate::unit::ChangeUnit;

static NOOP_EVENTS: NoopEvents = NoopEvents;
static NOOP_NOTES: NoopNotes = NoopNotes;

/// Options for one run invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Preview mode: capture and report operations, apply and record nothing
    pub pretend: bool,
    /// Give every unit its own batch number instead of one batch per run
    pub step: bool,
}

/// Core orchestration engine
///
/// Computes the pending set against the ledger, resolves every pending unit
/// through the registry, executes them in identifier order with per-unit
/// transaction discipline, and records each success immediately after
/// execution. Dependencies are constructor-injected; progress reporting goes
/// through explicit sinks that default to no-ops.
///
/// Execution is single-threaded and sequential. The engine provides no
/// cross-process mutual exclusion: two concurrent invocations against one
/// ledger may both see the same pending set. Callers needing that guarantee
/// must lock externally.
pub struct Runner<'a> {
    ledger: &'a dyn Ledger,
    registry: &'a UnitRegistry,
    stores: &'a dyn StoreProvider,
    events: &'a dyn EventSink,
    notes: &'a dyn NoteSink,
    default_store: Option<String>,
}

impl<'a> Runner<'a> {
    /// Create a runner over the given ledger, registry, and store provider
    pub fn new(
        ledger: &'a dyn Ledger,
        registry: &'a UnitRegistry,
        stores: &'a dyn StoreProvider,
    ) -> Self {
        Self {
            ledger,
            registry,
            stores,
            events: &NOOP_EVENTS,
            notes: &NOOP_NOTES,
            default_store: None,
        }
    }

    /// Attach a lifecycle event sink
    #[must_use]
    pub fn with_events(mut self, events: &'a dyn EventSink) -> Self {
        self.events = events;
        self
    }

    /// Attach a progress note sink
    #[must_use]
    pub fn with_notes(mut self, notes: &'a dyn NoteSink) -> Self {
        self.notes = notes;
        self
    }

    /// Select the default target store for this runner and its ledger
    ///
    /// `None` restores the engine default.
    pub fn set_default_store(&mut self, name: Option<&str>) {
        self.ledger.set_target_store(name);
        self.default_store = name.map(String::from);
    }

    /// Run the pending change units found at the given locations
    ///
    /// Returns the identifiers that were processed, in application order.
    /// In pretend mode these were previewed, not applied; callers know which
    /// from the options they passed. An empty pending set is success: a
    /// "nothing to apply" note is emitted and an empty list returned.
    ///
    /// # Errors
    ///
    /// Propagates discovery, resolution, execution, and ledger failures
    /// unchanged. Resolution of every pending unit happens before any
    /// execution, so a resolution failure aborts with the store untouched.
    /// An execution failure aborts at that unit: earlier units stay
    /// recorded, the failed unit is not recorded, later units never run.
    pub fn run<P: AsRef<Path>>(
        &self,
        locations: &[P],
        options: RunOptions,
    ) -> Result<Vec<String>, EngineError> {
        let pending = self.pending_sources(locations)?;

        if pending.is_empty() {
            self.notes.note("Nothing to apply.");
            return Ok(Vec::new());
        }

        // Resolve everything up front: a partial resolution failure after
        // some units ran would leave the meaning of "pending" ambiguous.
        let units: Vec<Box<dyn ChangeUnit>> = pending
            .iter()
            .map(|source| self.registry.resolve(&source.identifier))
            .collect::<Result<_, _>>()?;

        let mut batch = self.ledger.next_batch_number()?;

        self.events.dispatch(&RunEvent::RunStarted);

        for unit in &units {
            if options.pretend {
                self.pretend_unit(unit.as_ref())?;
            } else {
                self.apply_unit(unit.as_ref(), batch)?;
            }

            if options.step {
                batch += 1;
            }
        }

        self.events.dispatch(&RunEvent::RunEnded);

        Ok(pending.into_iter().map(|source| source.identifier).collect())
    }

    /// Identifiers discovered at the given locations but absent from the ledger
    ///
    /// # Errors
    ///
    /// Propagates discovery and ledger failures.
    pub fn pending<P: AsRef<Path>>(&self, locations: &[P]) -> Result<Vec<String>, EngineError> {
        Ok(self
            .pending_sources(locations)?
            .into_iter()
            .map(|source| source.identifier)
            .collect())
    }

    /// Capture the operations a unit would perform, without touching any store
    ///
    /// The unit's real `apply()` runs against the capturing backend; every
    /// existence check answers `false` (fixed preview policy, see
    /// [`CaptureExecutor`]), so the captured statement list is deterministic.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnitExecutionFailed` if the unit's code fails.
    pub fn preview(&self, unit: &dyn ChangeUnit) -> Result<Vec<CapturedStatement>, EngineError> {
        let capture = CaptureExecutor::new();
        let schema = SchemaManager::new(&capture);

        unit.apply(&schema)
            .map_err(|e| EngineError::UnitExecutionFailed {
                identifier: unit.identifier().to_string(),
                error: e.to_string(),
            })?;

        Ok(capture.into_statements())
    }

    /// Provision the ledger when missing; returns whether it was created
    ///
    /// # Errors
    ///
    /// Propagates `exists()` and `initialize()` failures.
    pub fn create_ledger_if_missing(&self) -> Result<bool, EngineError> {
        if self.ledger.exists()? {
            return Ok(false);
        }
        self.ledger.initialize()?;
        self.notes.note("Ledger created.");
        Ok(true)
    }

    /// Discover sources and filter out already-applied identifiers
    ///
    /// Computed once per run; units recorded or added by another process
    /// mid-run are not picked up.
    fn pending_sources<P: AsRef<Path>>(
        &self,
        locations: &[P],
    ) -> Result<Vec<UnitSource>, EngineError> {
        let sources = discover_units(locations)?;
        let applied = self.ledger.list_applied()?;

        Ok(sources
            .into_iter()
            .filter(|source| !applied.contains(&source.identifier))
            .collect())
    }

    fn apply_unit(&self, unit: &dyn ChangeUnit, batch: i64) -> Result<(), EngineError> {
        let identifier = unit.identifier().to_string();

        self.notes.note(&format!("Applying: {identifier}"));
        let start = Instant::now();

        let store = self
            .stores
            .resolve(unit.target_store().or(self.default_store.as_deref()))?;

        self.events.dispatch(&RunEvent::UnitStarted {
            identifier: identifier.clone(),
        });

        let schema = SchemaManager::new(store.as_ref());
        let result = if store.supports_ddl_transactions() && unit.transactional() {
            Self::apply_in_transaction(store.as_ref(), unit, &schema)
        } else {
            unit.apply(&schema)
        };

        result.map_err(|e| EngineError::UnitExecutionFailed {
            identifier: identifier.clone(),
            error: e.to_string(),
        })?;

        self.events.dispatch(&RunEvent::UnitEnded {
            identifier: identifier.clone(),
        });

        // Recorded immediately after execution, one unit at a time: a crash
        // leaves at most the in-flight unit ambiguous, and a rerun retries it.
        self.ledger.record(&identifier, batch, Utc::now())?;

        let seconds = start.elapsed().as_secs_f64();
        self.notes
            .note(&format!("Applied:  {identifier} ({seconds:.2}s)"));
        log::info!("applied {identifier} in batch {batch} ({seconds:.2}s)");

        Ok(())
    }

    fn apply_in_transaction(
        store: &dyn StoreExecutor,
        unit: &dyn ChangeUnit,
        schema: &SchemaManager<'_>,
    ) -> Result<(), StoreError> {
        store.begin()?;
        match unit.apply(schema) {
            Ok(()) => store.commit(),
            Err(e) => {
                if let Err(rollback_err) = store.rollback() {
                    log::error!(
                        "rollback failed for {}: {rollback_err}",
                        unit.identifier()
                    );
                }
                Err(e)
            }
        }
    }

    fn pretend_unit(&self, unit: &dyn ChangeUnit) -> Result<(), EngineError> {
        let statements = self.preview(unit)?;
        let identifier = unit.identifier();

        for statement in &statements {
            self.notes.note(&format!("{identifier}: {statement}"));
        }

        Ok(())
    }
}
