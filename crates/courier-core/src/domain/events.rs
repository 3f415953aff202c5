//! Events - キューで発生したイベント
//!
//! EventSink に渡される観測用イベントです。ログ・メトリクスはすべてここを経由します。

use serde::Serialize;

use super::ItemId;

/// QueueEvent はキューのライフサイクルで発生したイベント
///
/// `Dropped` and `MalformedEntryDropped` are the variants that mean data was
/// lost for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    Enqueued {
        item_id: ItemId,
        queue_len: usize,
    },
    /// Pushed out by a newer item while the queue was full.
    Evicted {
        item_id: ItemId,
        retry_count: u32,
    },
    Delivered {
        item_id: ItemId,
        retry_count: u32,
    },
    RetryScheduled {
        item_id: ItemId,
        retry_count: u32,
        error: String,
    },
    /// Retry budget exhausted.
    Dropped {
        item_id: ItemId,
        retry_count: u32,
        error: String,
    },
    /// A persisted entry that no longer decodes; it is removed from the store.
    MalformedEntryDropped {
        index: usize,
        error: String,
    },
    DrainSkippedOffline,
    DrainCompleted {
        delivered: usize,
        retried: usize,
        dropped: usize,
        remaining: usize,
    },
    StoreReadFailed {
        error: String,
    },
    StoreWriteFailed {
        error: String,
    },
    RetryArmed {
        delay_ms: u64,
    },
    ConnectivityRegained,
}

impl QueueEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::Enqueued { .. } => "enqueued",
            QueueEvent::Evicted { .. } => "evicted",
            QueueEvent::Delivered { .. } => "delivered",
            QueueEvent::RetryScheduled { .. } => "retry_scheduled",
            QueueEvent::Dropped { .. } => "dropped",
            QueueEvent::MalformedEntryDropped { .. } => "malformed_entry_dropped",
            QueueEvent::DrainSkippedOffline => "drain_skipped_offline",
            QueueEvent::DrainCompleted { .. } => "drain_completed",
            QueueEvent::StoreReadFailed { .. } => "store_read_failed",
            QueueEvent::StoreWriteFailed { .. } => "store_write_failed",
            QueueEvent::RetryArmed { .. } => "retry_armed",
            QueueEvent::ConnectivityRegained => "connectivity_regained",
        }
    }
}
