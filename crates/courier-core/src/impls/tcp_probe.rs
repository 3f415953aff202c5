//! TcpProbeConnectivity - OS のネットワークシグナルがないホスト向けの観測
//!
//! 指定アドレスへの TCP connect を定期的に試し、結果を WatchConnectivity に流します。
//! 状態を更新するのはポーラー（と `probe()`）だけで、`fetch_once` は読み取り専用です。

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::debug;

use super::WatchConnectivity;
use crate::ports::{Connectivity, RegainedEvents};

pub struct TcpProbeConnectivity {
    target: String,
    connect_timeout: Duration,
    state: WatchConnectivity,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl TcpProbeConnectivity {
    /// `target` is a `host:port` pair, e.g. `"api.example.com:443"`.
    ///
    /// Starts out disconnected, so the first successful probe is a regained edge.
    pub fn new(target: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            target: target.into(),
            connect_timeout,
            state: WatchConnectivity::new(false),
            poller: Mutex::new(None),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Try one connect without touching the published state.
    async fn connect(&self) -> bool {
        let connected = matches!(
            tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.target)).await,
            Ok(Ok(_))
        );
        debug!(target_addr = %self.target, connected, "connectivity probe");
        connected
    }

    /// Probe once and publish the result.
    pub async fn probe(&self) -> bool {
        let connected = self.connect().await;
        self.state.set_connected(connected);
        connected
    }

    /// Probe every `every` in the background until `stop_polling` or drop.
    pub fn start_polling(self: &Arc<Self>, every: Duration) {
        let this = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(probe) = this.upgrade() else { break };
                probe.probe().await;
            }
        });

        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = poller.replace(handle) {
            previous.abort();
        }
    }

    pub fn stop_polling(&self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = poller.take() {
            handle.abort();
        }
    }
}

impl Drop for TcpProbeConnectivity {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[async_trait]
impl Connectivity for TcpProbeConnectivity {
    async fn fetch_once(&self) -> bool {
        self.connect().await
    }

    fn subscribe(&self) -> RegainedEvents {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn probe_succeeds_against_listening_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbeConnectivity::new(addr.to_string(), Duration::from_secs(1));
        let mut events = probe.subscribe();

        assert!(probe.probe().await);
        assert!(events.next().await.is_some());
        assert!(probe.state.is_connected());
    }

    #[tokio::test]
    async fn fetch_once_does_not_publish_an_edge() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbeConnectivity::new(addr.to_string(), Duration::from_secs(1));
        let mut events = probe.subscribe();

        assert!(probe.fetch_once().await);
        assert!(!probe.state.is_connected());
        let edge = tokio::time::timeout(Duration::from_millis(50), events.next()).await;
        assert!(edge.is_err());

        // the poller's probe still reports the edge
        assert!(probe.probe().await);
        assert!(events.next().await.is_some());
    }

    #[tokio::test]
    async fn probe_fails_against_closed_port() {
        // Bind then drop to get a port nobody listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let probe = TcpProbeConnectivity::new(addr.to_string(), Duration::from_millis(200));
        assert!(!probe.fetch_once().await);
    }
}
