//! TracingEventSink - イベントを `tracing` の構造化ログとして出す
//!
//! ログレベルの方針:
//! - `error`: データ損失（リトライ上限で破棄、読めないエントリの破棄）
//! - `warn`: 回復可能な障害（永続化失敗、送信失敗、容量超過）
//! - `info` / `debug`: 通常の流れ

use tracing::{debug, error, info, warn};

use crate::domain::QueueEvent;
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &QueueEvent) {
        match event {
            QueueEvent::Enqueued { item_id, queue_len } => {
                debug!(item_id = %item_id, queue_len, "event enqueued");
            }
            QueueEvent::Evicted {
                item_id,
                retry_count,
            } => {
                warn!(item_id = %item_id, retry_count, "queue full, evicted oldest event");
            }
            QueueEvent::Delivered {
                item_id,
                retry_count,
            } => {
                debug!(item_id = %item_id, retry_count, "event delivered");
            }
            QueueEvent::RetryScheduled {
                item_id,
                retry_count,
                error,
            } => {
                warn!(item_id = %item_id, retry_count, error = %error, "delivery failed, will retry");
            }
            QueueEvent::Dropped {
                item_id,
                retry_count,
                error,
            } => {
                error!(
                    item_id = %item_id,
                    retry_count,
                    error = %error,
                    "retry budget exhausted, event dropped"
                );
            }
            QueueEvent::MalformedEntryDropped { index, error } => {
                error!(index, error = %error, "malformed queue entry dropped");
            }
            QueueEvent::DrainSkippedOffline => {
                debug!("offline, drain skipped");
            }
            QueueEvent::DrainCompleted {
                delivered,
                retried,
                dropped,
                remaining,
            } => {
                info!(delivered, retried, dropped, remaining, "drain pass completed");
            }
            QueueEvent::StoreReadFailed { error } => {
                warn!(error = %error, "queue load failed, treating as empty");
            }
            QueueEvent::StoreWriteFailed { error } => {
                warn!(error = %error, "queue save failed");
            }
            QueueEvent::RetryArmed { delay_ms } => {
                debug!(delay_ms, "retry timer armed");
            }
            QueueEvent::ConnectivityRegained => {
                info!("connectivity regained, draining queue");
            }
        }
    }
}
