//! DeliveryWorker - 1 回のドレインパス
//!
//! # フロー
//! 1. 別のパスが実行中なら何もせずに戻る（single-flight）
//! 2. ネットワーク観測があり、オフラインならストアに触れずに戻る
//! 3. キューを読み込む（空なら何もしない）
//! 4. FIFO 順に 1 件ずつ送信 → 成功は削除、失敗は retry_count++ か破棄
//! 5. 残りを 1 回の書き込みで永続化

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{ItemId, QueueEvent, QueueItem};
use crate::ports::{EventSink, NetworkCapability, Transport, TransportError};
use crate::queue::{DurableQueue, RetryDecision, RetryPolicy};

/// Tally of one completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub retried: usize,
    pub dropped: usize,
    /// Items persisted after the pass, including ones enqueued meanwhile.
    pub remaining: usize,
    pub persisted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another pass holds the worker.
    AlreadyRunning,
    /// The probe said offline; the store was not touched.
    Offline,
    Empty,
    Completed(DrainReport),
}

impl DrainOutcome {
    /// Whether the scheduler should arrange another attempt.
    pub fn needs_retry(&self) -> bool {
        match self {
            DrainOutcome::Offline => true,
            DrainOutcome::Completed(report) => report.remaining > 0,
            DrainOutcome::AlreadyRunning | DrainOutcome::Empty => false,
        }
    }
}

pub struct DeliveryWorker {
    queue: Arc<DurableQueue>,
    transport: Arc<dyn Transport>,
    network: NetworkCapability,
    policy: RetryPolicy,
    capacity: usize,
    sink: Arc<dyn EventSink>,
    in_flight: Mutex<()>,
}

impl DeliveryWorker {
    pub fn new(
        queue: Arc<DurableQueue>,
        transport: Arc<dyn Transport>,
        network: NetworkCapability,
        policy: RetryPolicy,
        capacity: usize,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            queue,
            transport,
            network,
            policy,
            capacity,
            sink,
            in_flight: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Is a pass running right now?
    pub fn is_draining(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Wait until no pass is running.
    pub async fn wait_idle(&self) {
        let _idle = self.in_flight.lock().await;
    }

    /// Run one pass over the whole queue. Never fails.
    pub async fn drain_once(&self) -> DrainOutcome {
        let Ok(_in_flight) = self.in_flight.try_lock() else {
            debug!("drain already in progress, skipping");
            return DrainOutcome::AlreadyRunning;
        };

        if self.network.probe().await == Some(false) {
            self.sink.emit(&QueueEvent::DrainSkippedOffline);
            return DrainOutcome::Offline;
        }

        let items = self.queue.load().await;
        if items.is_empty() {
            return DrainOutcome::Empty;
        }

        let snapshot: HashSet<ItemId> = items.iter().map(|item| item.id).collect();
        let mut report = DrainReport::default();
        let mut survivors = Vec::with_capacity(items.len());

        for mut item in items {
            if self.policy.exceeds_budget(&item) {
                report.dropped += 1;
                self.sink.emit(&QueueEvent::Dropped {
                    item_id: item.id,
                    retry_count: item.retry_count,
                    error: "retry budget already exceeded".to_string(),
                });
                continue;
            }

            match self.attempt(&item).await {
                Ok(()) => {
                    report.delivered += 1;
                    self.sink.emit(&QueueEvent::Delivered {
                        item_id: item.id,
                        retry_count: item.retry_count,
                    });
                }
                Err(err) => match self.policy.on_failure(&mut item) {
                    RetryDecision::Retry { retry_count } => {
                        report.retried += 1;
                        self.sink.emit(&QueueEvent::RetryScheduled {
                            item_id: item.id,
                            retry_count,
                            error: err.to_string(),
                        });
                        survivors.push(item);
                    }
                    RetryDecision::Drop => {
                        report.dropped += 1;
                        self.sink.emit(&QueueEvent::Dropped {
                            item_id: item.id,
                            retry_count: item.retry_count,
                            error: err.to_string(),
                        });
                    }
                },
            }
        }

        let commit = self
            .queue
            .commit_pass(&snapshot, survivors, self.capacity)
            .await;
        report.remaining = commit.remaining;
        report.persisted = commit.persisted;

        self.sink.emit(&QueueEvent::DrainCompleted {
            delivered: report.delivered,
            retried: report.retried,
            dropped: report.dropped,
            remaining: report.remaining,
        });
        DrainOutcome::Completed(report)
    }

    /// One delivery call. A panicking transport counts as a failure.
    async fn attempt(&self, item: &QueueItem) -> Result<(), TransportError> {
        let send = self.transport.send(&item.payload, &item.headers);
        match AssertUnwindSafe(send).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(TransportError::Panicked(panic_message(panic.as_ref()))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "transport panicked".to_string()
    }
}
