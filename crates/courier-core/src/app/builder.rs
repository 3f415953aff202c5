//! QueueBuilder - コントローラの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 必須コンポーネントの不足は build() 時にエラー

use std::sync::Arc;

use crate::app::controller::{ControllerParts, QueueController};
use crate::app::scheduler::RetryScheduler;
use crate::app::worker::DeliveryWorker;
use crate::config::{ConfigError, QueueConfig};
use crate::impls::TracingEventSink;
use crate::observability::CountingSink;
use crate::ports::{
    Clock, Connectivity, EventSink, FanoutSink, IdGenerator, KeyValueStore, NetworkCapability,
    SystemClock, Transport, UlidGenerator,
};
use crate::queue::{DurableQueue, RetryPolicy};

/// QueueBuilder は QueueController を構築
///
/// # 使用例
/// ```ignore
/// let controller = QueueBuilder::new(QueueConfig::default())
///     .store(Arc::new(FileStore::open(".courier").await?))
///     .transport(Arc::new(my_transport))
///     .connectivity(Arc::new(WatchConnectivity::new(true)))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store / transport が無ければ BuildError::MissingComponent
/// - 設定値は QueueConfig::validate() で検証
/// - connectivity を渡さなければタイマーのみで再送する
pub struct QueueBuilder {
    config: QueueConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    transport: Option<Arc<dyn Transport>>,
    network: NetworkCapability,
    sinks: Vec<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError はコントローラ構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing component: {0}. Set it on the builder before build().")]
    MissingComponent(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueueBuilder {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            store: None,
            transport: None,
            network: NetworkCapability::Absent,
            sinks: Vec::new(),
            clock: None,
            ids: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Host can observe connectivity. Without this the queue polls on a timer.
    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.network = NetworkCapability::present(connectivity);
        self
    }

    /// Add an event sink. With none, events go to `tracing`.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// QueueBuilder を構築して QueueController を生成
    ///
    /// # 検証
    /// - QueueConfig::validate()
    /// - store と transport が設定されているか
    pub fn build(self) -> Result<QueueController, BuildError> {
        self.config.validate()?;
        let store = self.store.ok_or(BuildError::MissingComponent("store"))?;
        let transport = self
            .transport
            .ok_or(BuildError::MissingComponent("transport"))?;

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids: Arc<dyn IdGenerator> = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));

        let counts = Arc::new(CountingSink::new());
        let mut fanout = FanoutSink::new(vec![counts.clone() as Arc<dyn EventSink>]);
        if self.sinks.is_empty() {
            fanout.push(Arc::new(TracingEventSink));
        }
        for sink in self.sinks {
            fanout.push(sink);
        }
        let sink: Arc<dyn EventSink> = Arc::new(fanout);

        let queue = Arc::new(DurableQueue::new(
            store,
            self.config.storage_key.clone(),
            sink.clone(),
        ));
        let policy = RetryPolicy::from_config(&self.config);
        let worker = Arc::new(DeliveryWorker::new(
            queue.clone(),
            transport,
            self.network.clone(),
            policy,
            self.config.max_queue_size,
            sink.clone(),
        ));
        let scheduler = Arc::new(RetryScheduler::new(worker.clone(), sink.clone()));

        Ok(QueueController::from_parts(ControllerParts {
            config: self.config,
            queue,
            worker,
            scheduler,
            network: self.network,
            ids,
            clock,
            counts,
            sink,
        }))
    }
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryStore, NoopEventSink, ScriptedTransport};
    use rstest::rstest;
    use std::time::Duration;

    #[test]
    fn test_build_success() {
        let controller = QueueBuilder::default()
            .store(Arc::new(InMemoryStore::new()))
            .transport(Arc::new(ScriptedTransport::succeeding()))
            .event_sink(Arc::new(NoopEventSink))
            .build();
        assert!(controller.is_ok());
    }

    #[test]
    fn test_build_missing_store() {
        let result = QueueBuilder::default()
            .transport(Arc::new(ScriptedTransport::succeeding()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingComponent("store"))));
    }

    #[test]
    fn test_build_missing_transport() {
        let result = QueueBuilder::default()
            .store(Arc::new(InMemoryStore::new()))
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingComponent("transport"))
        ));
    }

    #[rstest]
    #[case::zero_queue(QueueConfig::default().with_max_queue_size(0))]
    #[case::zero_interval(QueueConfig::default().with_retry_interval(Duration::ZERO))]
    #[case::empty_key(QueueConfig::default().with_storage_key(""))]
    fn test_build_rejects_invalid_config(#[case] config: QueueConfig) {
        let result = QueueBuilder::new(config)
            .store(Arc::new(InMemoryStore::new()))
            .transport(Arc::new(ScriptedTransport::succeeding()))
            .build();
        assert!(matches!(result, Err(BuildError::Config(_))));
    }
}
