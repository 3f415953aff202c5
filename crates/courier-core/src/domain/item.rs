//! Queue item: one location event waiting for delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ItemId;

/// Payload + metadata for an event in the offline queue.
///
/// Wire format (one element of the persisted JSON array):
/// `{"id": "...", "data": {...}, "headers": {...}, "timestamp": 1700000000000, "retryCount": 0}`
///
/// Design:
/// - `payload` and `headers` are opaque to the queue; the transport decides what they mean.
/// - `enqueued_at` is informational. Ordering comes from the position in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: ItemId,

    /// The location event itself.
    #[serde(rename = "data")]
    pub payload: Value,

    /// Auxiliary data the transport call needs (auth context and the like).
    #[serde(default)]
    pub headers: Value,

    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub enqueued_at: DateTime<Utc>,

    /// Number of failed delivery attempts so far.
    #[serde(default)]
    pub retry_count: u32,
}

impl QueueItem {
    pub fn new(id: ItemId, payload: Value, headers: Value, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id,
            payload,
            headers,
            enqueued_at,
            retry_count: 0,
        }
    }

    /// Count one more failed attempt.
    pub fn record_failure(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
    }
}
