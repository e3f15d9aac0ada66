//! Engine error taxonomy

/// Errors that can occur during change-unit orchestration
#[derive(Debug)]
pub enum EngineError {
    /// The ledger's backing store cannot be reached or is unusable
    StoreUnavailable(String),
    /// Ledger provisioning was requested but it already exists
    AlreadyInitialized,
    /// Ledger provisioning failed at the store level
    ProvisioningFailed(String),
    /// A discovered identifier has no registered unit
    UnitResolutionFailed { identifier: String },
    /// A unit's execution failed
    UnitExecutionFailed { identifier: String, error: String },
    /// A ledger entry already exists for the identifier
    DuplicateUnit { identifier: String },
    /// A registry entry already exists for the identifier
    UnitAlreadyRegistered { identifier: String },
    /// A source location could not be read
    SourceUnreadable(String),
    /// A unit file name does not follow the naming convention
    InvalidUnitName(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::StoreUnavailable(msg) => write!(f, "Store unavailable: {msg}"),
            EngineError::AlreadyInitialized => {
                write!(f, "Ledger is already initialized")
            }
            EngineError::ProvisioningFailed(msg) => {
                write!(f, "Ledger provisioning failed: {msg}")
            }
            EngineError::UnitResolutionFailed { identifier } => {
                write!(
                    f,
                    "No change unit registered for '{identifier}'.\n\
                     A source file exists but its type was not registered at startup."
                )
            }
            EngineError::UnitExecutionFailed { identifier, error } => {
                write!(f, "Change unit '{identifier}' failed: {error}")
            }
            EngineError::DuplicateUnit { identifier } => {
                write!(f, "Change unit '{identifier}' is already recorded in the ledger")
            }
            EngineError::UnitAlreadyRegistered { identifier } => {
                write!(f, "Change unit '{identifier}' is already registered")
            }
            EngineError::SourceUnreadable(msg) => {
                write!(f, "Cannot read unit sources: {msg}")
            }
            EngineError::InvalidUnitName(msg) => {
                write!(f, "Invalid unit name: {msg}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_identifier() {
        let err = EngineError::UnitExecutionFailed {
            identifier: "2024_01_01_000000_create_x".to_string(),
            error: "syntax error".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("2024_01_01_000000_create_x"));
        assert!(text.contains("syntax error"));
    }

    #[test]
    fn test_resolution_failure_mentions_registration() {
        let err = EngineError::UnitResolutionFailed {
            identifier: "2024_01_01_000000_create_x".to_string(),
        };
        assert!(err.to_string().contains("not registered"));
    }
}
