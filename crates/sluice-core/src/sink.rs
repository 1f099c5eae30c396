//! Event sinks.

use parking_lot::Mutex;
use tracing::info;

use crate::event::LedgerEvent;
use crate::traits::EventSink;

/// Logs every event at `info` with the event name, actor, and JSON-free fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LedgerEvent) {
        let actor = event.actor().map(|a| a.short()).unwrap_or_default();
        info!(event = event.name(), actor = %actor, at = event.at(), detail = ?event, "ledger event");
    }
}

/// Keeps every event in memory, in commit order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the journal so far.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain the journal.
    pub fn take(&self) -> Vec<LedgerEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Events with the given name, in order.
    pub fn named(&self, name: &str) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.name() == name)
            .cloned()
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LedgerEvent) {
        self.events.lock().push(event.clone());
    }
}
