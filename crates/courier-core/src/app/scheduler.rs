//! RetryScheduler - 再送タイマーと接続回復トリガー
//!
//! # 状態
//! - `Idle`: タイマーなし
//! - `RetryArmed`: タイマーがちょうど 1 つ存在する
//!
//! # 設計原則
//! - `arm()` は前のタイマーを必ずキャンセルしてから張り直す（タイマーは最大 1 つ）
//! - spawn したタスクは `Weak` しか持たない（スケジューラの drop を妨げない）
//! - ネットワーク観測が無い場合は recurring モード：タイマーが無くなったら再度 arm する
//! - 手動パスは既存の recurring タイマーを動かさない（空の flush でポーリングが遅れないように）

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::worker::{DeliveryWorker, DrainOutcome};
use crate::domain::QueueEvent;
use crate::ports::{EventSink, NetworkCapability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    RetryArmed,
}

#[derive(Default)]
struct Slots {
    active: bool,
    recurring: bool,
    /// Bumped on every arm/shutdown; a timer only fires for its own generation.
    generation: u64,
    timer: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

pub struct RetryScheduler {
    worker: Arc<DeliveryWorker>,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    slots: Mutex<Slots>,
}

impl RetryScheduler {
    /// The timer interval comes from the worker's retry policy.
    pub fn new(worker: Arc<DeliveryWorker>, sink: Arc<dyn EventSink>) -> Self {
        let interval = worker.policy().interval;
        Self {
            worker,
            interval,
            sink,
            slots: Mutex::new(Slots::default()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SchedulerState {
        if self.slots().timer.is_some() {
            SchedulerState::RetryArmed
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.slots().active
    }

    pub fn is_recurring(&self) -> bool {
        self.slots().recurring
    }

    /// Start accepting arm requests.
    ///
    /// With connectivity present, a listener task turns each regained edge into
    /// an out-of-band pass. Without it, the scheduler polls every `interval`.
    pub fn activate(self: &Arc<Self>, network: &NetworkCapability) {
        let mut slots = self.slots();
        if slots.active {
            return;
        }
        slots.active = true;
        slots.recurring = !network.is_present();

        if let NetworkCapability::Present(connectivity) = network {
            let mut regained = connectivity.subscribe();
            let weak = Arc::downgrade(self);
            slots.listener = Some(tokio::spawn(async move {
                while regained.next().await.is_some() {
                    let Some(scheduler) = weak.upgrade() else {
                        break;
                    };
                    scheduler.sink.emit(&QueueEvent::ConnectivityRegained);
                    tokio::spawn(async move {
                        scheduler.drain_now().await;
                    });
                }
            }));
        }
    }

    /// Replace any pending timer with a fresh one for `interval`.
    /// No-op when the scheduler is not active.
    pub fn arm(self: &Arc<Self>) {
        let mut slots = self.slots();
        if !slots.active {
            return;
        }
        if let Some(previous) = slots.timer.take() {
            previous.abort();
        }
        slots.generation += 1;
        let generation = slots.generation;

        let weak: Weak<Self> = Arc::downgrade(self);
        let interval = self.interval;
        slots.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(scheduler) = weak.upgrade() {
                scheduler.fire(generation).await;
            }
        }));
        drop(slots);

        self.sink.emit(&QueueEvent::RetryArmed {
            delay_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        });
    }

    /// Run one pass now and arm a timer if the result asks for it.
    ///
    /// A failed pass restarts the timer. In recurring mode a clean pass only
    /// arms when no timer is pending, so the poll cadence stays fixed.
    pub async fn drain_now(self: &Arc<Self>) -> DrainOutcome {
        let outcome = self.worker.drain_once().await;
        match outcome {
            // the pass that holds the worker arms for itself
            DrainOutcome::AlreadyRunning => {}
            _ if outcome.needs_retry() => self.arm(),
            _ if self.is_recurring() => self.keep_polling(),
            _ => {}
        }
        outcome
    }

    fn keep_polling(self: &Arc<Self>) {
        if self.slots().timer.is_none() {
            self.arm();
        }
    }

    /// Cancel the timer and the connectivity listener. A pass already in
    /// flight is left to finish.
    pub fn shutdown(&self) {
        let mut slots = self.slots();
        slots.active = false;
        slots.generation += 1;
        if let Some(timer) = slots.timer.take() {
            timer.abort();
        }
        if let Some(listener) = slots.listener.take() {
            listener.abort();
        }
    }

    async fn fire(self: Arc<Self>, generation: u64) {
        {
            let mut slots = self.slots();
            if !slots.active || slots.generation != generation {
                return;
            }
            slots.timer = None;
        }
        debug!(generation, "retry timer fired");
        self.drain_now().await;
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
