//! QueueController - ホストが保持する公開コンポーネント
//!
//! # ライフサイクル
//! 1. `QueueBuilder::build()` で構築
//! 2. `start()`: 接続回復を購読し、即座に 1 パス実行
//! 3. `enqueue()`: 永続化してからバックグラウンドでパスを起動（オフライン判定はパス側）
//! 4. `stop()`: タイマーと購読を解除し、実行中のパスの完了を待つ
//!
//! 実行時のエラーはホストに返しません（イベントとして報告されます）。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::app::scheduler::RetryScheduler;
use crate::app::status::QueueStatus;
use crate::app::worker::{DeliveryWorker, DrainOutcome};
use crate::config::QueueConfig;
use crate::domain::{ItemId, QueueEvent, QueueItem, Result};
use crate::observability::{CountingSink, DeliveryCounts};
use crate::ports::{Clock, EventSink, IdGenerator, NetworkCapability};
use crate::queue::DurableQueue;

pub struct QueueController {
    config: QueueConfig,
    queue: Arc<DurableQueue>,
    worker: Arc<DeliveryWorker>,
    scheduler: Arc<RetryScheduler>,
    network: NetworkCapability,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    counts: Arc<CountingSink>,
    sink: Arc<dyn EventSink>,
    running: AtomicBool,
}

/// Everything `QueueBuilder` wires together.
pub(crate) struct ControllerParts {
    pub config: QueueConfig,
    pub queue: Arc<DurableQueue>,
    pub worker: Arc<DeliveryWorker>,
    pub scheduler: Arc<RetryScheduler>,
    pub network: NetworkCapability,
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
    pub counts: Arc<CountingSink>,
    pub sink: Arc<dyn EventSink>,
}

impl QueueController {
    pub(crate) fn from_parts(parts: ControllerParts) -> Self {
        Self {
            config: parts.config,
            queue: parts.queue,
            worker: parts.worker,
            scheduler: parts.scheduler,
            network: parts.network,
            ids: parts.ids,
            clock: parts.clock,
            counts: parts.counts,
            sink: parts.sink,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to regained edges (or start polling without them) and run one
    /// pass immediately. Calling it again while running does nothing.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            storage_key = %self.config.storage_key,
            connectivity = self.network.is_present(),
            "delivery queue started"
        );
        self.scheduler.activate(&self.network);
        self.scheduler.drain_now().await;
    }

    /// Cancel the timer and the subscription, then wait for an in-flight pass
    /// to persist. Safe to call repeatedly or before `start`.
    pub async fn stop(&self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.scheduler.shutdown();
        self.worker.wait_idle().await;
        if was_running {
            info!(storage_key = %self.config.storage_key, "delivery queue stopped");
        }
    }

    /// Persist a new item and, when running, kick off a pass in the
    /// background. Returns once the item is stored.
    pub async fn enqueue(&self, payload: Value, headers: Value) -> ItemId {
        let item = QueueItem::new(
            self.ids.generate_item_id(),
            payload,
            headers,
            self.clock.now(),
        );
        let item_id = item.id;

        let appended = self.queue.append(item, self.config.max_queue_size).await;
        self.sink.emit(&QueueEvent::Enqueued {
            item_id,
            queue_len: appended.queue_len,
        });

        // the pass probes connectivity itself and skips when offline
        if self.is_running() {
            let scheduler = self.scheduler.clone();
            tokio::spawn(async move {
                scheduler.drain_now().await;
            });
        }
        item_id
    }

    /// Serialize `event` to JSON and enqueue it.
    pub async fn enqueue_event<P>(&self, event: &P, headers: Value) -> Result<ItemId>
    where
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(event)?;
        Ok(self.enqueue(payload, headers).await)
    }

    /// Run one pass on the caller's task.
    pub async fn flush_now(&self) -> DrainOutcome {
        self.scheduler.drain_now().await
    }

    pub async fn pending(&self) -> Vec<QueueItem> {
        self.queue.load().await
    }

    pub fn counts(&self) -> DeliveryCounts {
        self.counts.snapshot()
    }

    pub async fn status(&self) -> QueueStatus {
        QueueStatus {
            running: self.is_running(),
            draining: self.worker.is_draining(),
            scheduler: self.scheduler.state(),
            pending: self.queue.load().await.len(),
            counts: self.counts.snapshot(),
        }
    }

    /// Drop every pending item. `false` if the store refused.
    pub async fn clear(&self) -> bool {
        self.queue.clear().await
    }
}

impl Drop for QueueController {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}
