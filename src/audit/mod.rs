//! Audit trail
//!
//! Append-only record of joins, messages and departures, kept apart from
//! operational logging. Recording never fails from the caller's point of view.

pub mod file;

use std::sync::Mutex;

pub use file::FileAuditSink;

/// Receives one audit event at a time.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &str);
}

/// Keeps events in memory, without timestamps.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<String> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &str) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.to_string());
    }
}

/// Discards everything. Used when the audit file cannot be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: &str) {}
}
