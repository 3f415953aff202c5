//! WatchConnectivity - ホストが状態を流し込む Connectivity 実装
//!
//! # 学習ポイント
//! - `watch` はレベル（いまの状態）を保持する
//! - `broadcast` はエッジ（切断→接続の瞬間）だけを配る
//! - 購読解除は Receiver を drop するだけ

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use crate::ports::{Connectivity, RegainedEvents};

const EDGE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct WatchConnectivity {
    state: watch::Sender<bool>,
    regained: broadcast::Sender<()>,
}

impl WatchConnectivity {
    pub fn new(connected: bool) -> Self {
        let (state, _) = watch::channel(connected);
        let (regained, _) = broadcast::channel(EDGE_CHANNEL_CAPACITY);
        Self { state, regained }
    }

    /// Report the current network state.
    ///
    /// Subscribers hear about it only on a disconnected→connected transition.
    pub fn set_connected(&self, connected: bool) {
        let was_connected = self.state.send_replace(connected);
        if connected && !was_connected {
            // no subscribers is fine
            let _ = self.regained.send(());
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow()
    }

    /// Level-triggered view of the state, for hosts that want it.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

#[async_trait]
impl Connectivity for WatchConnectivity {
    async fn fetch_once(&self) -> bool {
        self.is_connected()
    }

    fn subscribe(&self) -> RegainedEvents {
        RegainedEvents::new(self.regained.subscribe())
    }
}
