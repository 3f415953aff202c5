//! EventSink port - イベント記録の抽象化
//!
//! ログ・メトリクスの出力先をコアロジックから切り離します。
//!
//! # 実装
//! - TracingEventSink: `tracing` に構造化ログとして出す（デフォルト）
//! - MemoryEventSink: テスト用に記録する
//! - NoopEventSink: 何もしない

use std::sync::Arc;

use crate::domain::QueueEvent;

/// EventSink はキューのイベントを記録
///
/// `emit` は同期で、失敗しません。重い処理はしないこと。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &QueueEvent);
}

/// Forwards every event to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &QueueEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
