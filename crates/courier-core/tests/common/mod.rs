#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use courier_core::impls::{InMemoryStore, MemoryEventSink, ScriptedTransport};
use courier_core::{QueueBuilder, QueueConfig, QueueController};
use serde_json::{Value, json};

pub const RETRY_INTERVAL: Duration = Duration::from_secs(30);

pub struct Harness {
    pub controller: Arc<QueueController>,
    pub store: Arc<InMemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub sink: Arc<MemoryEventSink>,
}

pub fn config() -> QueueConfig {
    QueueConfig::default()
        .with_max_queue_size(50)
        .with_max_retry_count(3)
        .with_retry_interval(RETRY_INTERVAL)
}

/// Controller over an in-memory store, without a connectivity signal.
pub fn harness(config: QueueConfig, transport: ScriptedTransport) -> Harness {
    harness_with(config, transport, |builder| builder)
}

pub fn harness_with(
    config: QueueConfig,
    transport: ScriptedTransport,
    customize: impl FnOnce(QueueBuilder) -> QueueBuilder,
) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(transport);
    let sink = Arc::new(MemoryEventSink::new());
    let builder = QueueBuilder::new(config)
        .store(store.clone())
        .transport(transport.clone())
        .event_sink(sink.clone());
    let controller = customize(builder).build().expect("valid test controller");
    Harness {
        controller: Arc::new(controller),
        store,
        transport,
        sink,
    }
}

pub fn location(seq: u32) -> Value {
    json!({ "seq": seq, "lat": 35.68, "lng": 139.76 })
}

pub fn headers() -> Value {
    json!({ "authorization": "Bearer test" })
}

pub fn seqs(values: &[Value]) -> Vec<u64> {
    values.iter().filter_map(|v| v["seq"].as_u64()).collect()
}

/// Let spawned tasks run without moving the paused clock past any timer.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
