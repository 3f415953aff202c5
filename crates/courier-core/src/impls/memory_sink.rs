//! MemoryEventSink / NoopEventSink

use std::sync::{Mutex, PoisonError};

use crate::domain::QueueEvent;
use crate::ports::EventSink;

/// Records every event in memory. Useful for tests and host-side inspection.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<QueueEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<QueueEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events whose `QueueEvent::name` equals `name`.
    pub fn named(&self, name: &str) -> Vec<QueueEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.name() == name)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: &QueueEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &QueueEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_filters_events() {
        let sink = MemoryEventSink::new();
        sink.emit(&QueueEvent::DrainSkippedOffline);
        sink.emit(&QueueEvent::RetryArmed { delay_ms: 10 });
        sink.emit(&QueueEvent::DrainSkippedOffline);

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.named("drain_skipped_offline").len(), 2);

        sink.clear();
        assert!(sink.events().is_empty());
    }
}
