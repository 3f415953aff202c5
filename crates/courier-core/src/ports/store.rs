//! KeyValueStore port - 永続化の抽象化
//!
//! キューは 1 つの固定キーに JSON 配列として保存されます。
//!
//! # 実装
//! - **InMemoryStore**: テスト・開発用（障害注入つき）
//! - **FileStore**: キーごとに 1 ファイル（プロセス再起動をまたいで残る）

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// KeyValueStore は文字列キーで文字列値を読み書きする
///
/// # 設計原則
/// - last-write-wins（トランザクション保証は不要）
/// - `set` が失敗した場合、以前の値はそのまま残る
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
