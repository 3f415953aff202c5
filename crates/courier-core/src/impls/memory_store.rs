//! InMemoryStore - 開発・テスト用の KeyValueStore
//!
//! # 学習ポイント
//! - RwLock による読み書きの排他制御
//! - 障害注入（読み込み失敗・書き込み失敗）でエラー経路をテストする
//! - 書き込み回数を数えて「書き込みが起きていない」ことを検証する

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{KeyValueStore, StoreError};

/// InMemoryStore はプロセス内だけで生きる KeyValueStore
///
/// # 使用例
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// store.fail_writes(true); // 以降の set は失敗する
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `get` fail until switched back.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every following `set`/`remove` fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set`/`remove` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read a value, bypassing failure injection.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Write a value, bypassing failure injection and the write counter.
    pub async fn insert_raw(&self, key: &str, value: impl Into<String>) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.into());
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        self.entries.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        self.entries.write().await.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let store = InMemoryStore::new();
        store.set("k", "v".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_value() {
        let store = InMemoryStore::new();
        store.set("k", "old".to_string()).await.unwrap();

        store.fail_writes(true);
        assert!(store.set("k", "new".to_string()).await.is_err());

        store.fail_writes(false);
        assert_eq!(store.get("k").await.unwrap(), Some("old".to_string()));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn injected_read_failure() {
        let store = InMemoryStore::new();
        store.insert_raw("k", "v").await;
        store.fail_reads(true);
        assert!(store.get("k").await.is_err());
        assert_eq!(store.raw("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn remove_missing_key_is_ok() {
        let store = InMemoryStore::new();
        store.remove("missing").await.unwrap();
    }
}
