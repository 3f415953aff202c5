//! Transport port - 位置イベントをサーバに送る外部協調者
//!
//! キューは送信の中身を知りません。成功か失敗かだけを見ます。

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Any variant counts as a failed attempt; the queue does not distinguish them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with an error.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The request never got an answer.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The transport future panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Transport は 1 件の位置イベントを送信する
///
/// # 設計原則
/// - タイムアウトやキャンセルは実装側のポリシーに任せる
/// - panic してもキューは `Err` と同じ扱いにする
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: &Value, headers: &Value) -> Result<(), TransportError>;
}
