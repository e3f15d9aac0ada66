//! Unit registry: identifier to factory mapping
//!
//! Resolution is a deterministic lookup in an explicit map, populated by the
//! wiring layer at startup (typically one `register` call per compiled unit).
//! There is no global state and no runtime reflection.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::unit::ChangeUnit;

/// Factory producing a fresh unit instance
pub type UnitFactory = Box<dyn Fn() -> Box<dyn ChangeUnit> + Send + Sync>;

/// Explicit map from canonical identifier to unit factory
#[derive(Default)]
pub struct UnitRegistry {
    factories: HashMap<String, UnitFactory>,
}

impl UnitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit type with a `Default` constructor
    ///
    /// The identifier is taken from a probe instance, so the registered key
    /// always matches what the unit reports at execution time.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnitAlreadyRegistered` if the identifier is taken.
    pub fn register<U>(&mut self) -> Result<(), EngineError>
    where
        U: ChangeUnit + Default + 'static,
    {
        let identifier = U::default().identifier().to_string();
        self.register_factory(identifier, Box::new(|| Box::new(U::default())))
    }

    /// Register a factory under an explicit identifier
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnitAlreadyRegistered` if the identifier is taken.
    pub fn register_factory(
        &mut self,
        identifier: impl Into<String>,
        factory: UnitFactory,
    ) -> Result<(), EngineError> {
        let identifier = identifier.into();
        if self.factories.contains_key(&identifier) {
            return Err(EngineError::UnitAlreadyRegistered { identifier });
        }
        self.factories.insert(identifier, factory);
        Ok(())
    }

    /// Resolve an identifier to a fresh unit instance
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnitResolutionFailed` if no factory is registered.
    pub fn resolve(&self, identifier: &str) -> Result<Box<dyn ChangeUnit>, EngineError> {
        self.factories
            .get(identifier)
            .map(|factory| factory())
            .ok_or_else(|| EngineError::UnitResolutionFailed {
                identifier: identifier.to_string(),
            })
    }

    /// Whether an identifier has a registered factory
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Registered identifiers, sorted ascending
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self.factories.keys().cloned().collect();
        identifiers.sort_unstable();
        identifiers
    }

    /// Number of registered units
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
