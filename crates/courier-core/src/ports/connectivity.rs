//! Connectivity port - ネットワーク状態の観測（オプショナル機能）
//!
//! ホストによってはネットワーク状態のシグナルが存在しません。
//! その場合は `NetworkCapability::Absent` として扱い、タイマーだけで再送します。
//!
//! # 実装
//! - **WatchConnectivity**: ホストが状態を流し込む
//! - **TcpProbeConnectivity**: TCP connect による定期プローブ

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Connectivity はネットワーク状態を報告する
///
/// # 設計原則
/// - `fetch_once` は 1 回限りのプローブ
/// - `subscribe` は切断→接続の**エッジ**ごとに 1 回だけ通知する（レベルではない）
/// - 購読解除は `RegainedEvents` を drop するだけ
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn fetch_once(&self) -> bool;

    fn subscribe(&self) -> RegainedEvents;
}

/// Stream of connectivity-regained edges.
#[derive(Debug)]
pub struct RegainedEvents {
    rx: broadcast::Receiver<()>,
}

impl RegainedEvents {
    pub fn new(rx: broadcast::Receiver<()>) -> Self {
        Self { rx }
    }

    /// Wait for the next edge. `None` once the observer is gone.
    ///
    /// A lagged receiver still reports one edge: several missed regains collapse
    /// into one drain trigger.
    pub async fn next(&mut self) -> Option<()> {
        match self.rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => Some(()),
            Err(RecvError::Closed) => None,
        }
    }
}

/// Whether the host can observe connectivity at all.
#[derive(Clone, Default)]
pub enum NetworkCapability {
    Present(Arc<dyn Connectivity>),
    #[default]
    Absent,
}

impl NetworkCapability {
    pub fn present(connectivity: Arc<dyn Connectivity>) -> Self {
        Self::Present(connectivity)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// One-shot probe. `None` means "unknown" (no capability).
    pub async fn probe(&self) -> Option<bool> {
        match self {
            Self::Present(connectivity) => Some(connectivity.fetch_once().await),
            Self::Absent => None,
        }
    }
}

impl fmt::Debug for NetworkCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(_) => f.write_str("NetworkCapability::Present"),
            Self::Absent => f.write_str("NetworkCapability::Absent"),
        }
    }
}
