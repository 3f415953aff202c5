//! courier-core
//!
//! Offline-tolerant delivery queue for periodic device-location events.
//! Events are persisted first, then replayed in FIFO order once the transport
//! succeeds or connectivity comes back.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, item, queue_state, events, errors）
//! - **config**: QueueConfig（上限・再送回数・再送間隔・ストレージキー）
//! - **ports**: 抽象化レイヤー（KeyValueStore, Transport, Connectivity, EventSink, Clock, IdGenerator）
//! - **queue**: 永続キュー（DurableQueue）と RetryPolicy
//! - **app**: アプリケーションロジック（builder, controller, worker, scheduler, status）
//! - **impls**: 実装（InMemoryStore, FileStore, WatchConnectivity など）
//! - **observability**: DeliveryCounts

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{
    BuildError, DrainOutcome, DrainReport, QueueBuilder, QueueController, QueueStatus,
    SchedulerState,
};
pub use config::{ConfigError, QueueConfig};
pub use domain::{CourierError, ItemId, QueueEvent, QueueItem, Result};
pub use observability::DeliveryCounts;
