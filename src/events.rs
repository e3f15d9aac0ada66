//! Run lifecycle notifications
//!
//! Progress UIs observe a run through two narrow interfaces: an event sink
//! for the four lifecycle events and a note sink for human-readable progress
//! lines. Both have explicit no-op implementations; the runner never checks
//! for absent listeners. Delivery is synchronous and best-effort.

/// Lifecycle event emitted during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A run with at least one pending unit has started
    RunStarted,
    /// A unit's execution is about to begin
    UnitStarted {
        /// The unit's canonical identifier
        identifier: String,
    },
    /// A unit's execution finished successfully
    UnitEnded {
        /// The unit's canonical identifier
        identifier: String,
    },
    /// The run finished (all units processed)
    RunEnded,
}

/// Receives lifecycle events
pub trait EventSink {
    /// Deliver one event; failures must not affect the run
    fn dispatch(&self, event: &RunEvent);
}

/// Event sink that ignores everything
pub struct NoopEvents;

impl EventSink for NoopEvents {
    fn dispatch(&self, _event: &RunEvent) {}
}

/// Receives human-readable progress notes
pub trait NoteSink {
    /// Deliver one progress line
    fn note(&self, message: &str);
}

/// Note sink that ignores everything
pub struct NoopNotes;

impl NoteSink for NoopNotes {
    fn note(&self, _message: &str) {}
}

/// Note sink that forwards to the `log` facade at info level
pub struct LogNotes;

impl NoteSink for LogNotes {
    fn note(&self, message: &str) {
        log::info!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sinks_accept_everything() {
        NoopEvents.dispatch(&RunEvent::RunStarted);
        NoopEvents.dispatch(&RunEvent::UnitStarted {
            identifier: "2024_01_01_000000_create_x".to_string(),
        });
        NoopNotes.note("Nothing to apply.");
    }
}
