use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::QueueEvent;
use crate::ports::EventSink;

/// Cumulative counters since the controller was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    pub enqueued: u64,
    pub delivered: u64,
    pub retried: u64,
    /// Retry budget exhausted or entry unreadable; these events are lost.
    pub dropped: u64,
    pub evicted: u64,
    pub drain_passes: u64,
    pub store_failures: u64,
}

/// EventSink that turns events into `DeliveryCounts`.
#[derive(Debug, Default)]
pub struct CountingSink {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
    evicted: AtomicU64,
    drain_passes: AtomicU64,
    store_failures: AtomicU64,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DeliveryCounts {
        DeliveryCounts {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            drain_passes: self.drain_passes.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

impl EventSink for CountingSink {
    fn emit(&self, event: &QueueEvent) {
        let counter = match event {
            QueueEvent::Enqueued { .. } => &self.enqueued,
            QueueEvent::Delivered { .. } => &self.delivered,
            QueueEvent::RetryScheduled { .. } => &self.retried,
            QueueEvent::Dropped { .. } | QueueEvent::MalformedEntryDropped { .. } => {
                &self.dropped
            }
            QueueEvent::Evicted { .. } => &self.evicted,
            QueueEvent::DrainCompleted { .. } => &self.drain_passes,
            QueueEvent::StoreReadFailed { .. } | QueueEvent::StoreWriteFailed { .. } => {
                &self.store_failures
            }
            QueueEvent::DrainSkippedOffline
            | QueueEvent::RetryArmed { .. }
            | QueueEvent::ConnectivityRegained => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
