use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::{Duration, sleep};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use courier_core::impls::{FileStore, TcpProbeConnectivity, WatchConnectivity};
use courier_core::ports::{Transport, TransportError};
use courier_core::{QueueBuilder, QueueConfig};

/// Demo host: produces location events and pushes them through a durable queue.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about)]
struct Args {
    /// JSON config file (fields of QueueConfig; missing ones use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory backing the file store
    #[arg(long, default_value = ".courier")]
    store_dir: PathBuf,

    /// Number of location events to produce
    #[arg(long, default_value_t = 5)]
    events: u32,

    /// Delay between produced events
    #[arg(long, default_value_t = 1000)]
    event_interval_ms: u64,

    /// The first N sends fail
    #[arg(long, default_value_t = 0)]
    fail_first: u32,

    /// Probability (0.0..=1.0) that any later send fails
    #[arg(long, default_value_t = 0.0)]
    failure_rate: f64,

    /// Start offline and come back online after this many seconds
    #[arg(long, default_value_t = 0)]
    offline_secs: u64,

    /// Run without a connectivity signal (timer-only retries)
    #[arg(long, conflicts_with = "probe_addr")]
    no_connectivity: bool,

    /// Detect connectivity by TCP-connecting to HOST:PORT instead of simulating it
    #[arg(long)]
    probe_addr: Option<String>,

    /// Seconds between TCP probes
    #[arg(long, default_value_t = 5)]
    probe_every_secs: u64,

    #[arg(long)]
    max_queue_size: Option<usize>,

    #[arg(long)]
    max_retry_count: Option<u32>,

    #[arg(long)]
    retry_interval_ms: Option<u64>,

    /// Give up waiting for the queue to settle after this many seconds
    #[arg(long, default_value_t = 120)]
    linger_secs: u64,
}

#[derive(Debug, Serialize)]
struct LocationEvent {
    device_id: String,
    seq: u32,
    lat: f64,
    lng: f64,
    recorded_at: DateTime<Utc>,
}

/// 本物のサーバの代わり：失敗を注入できる Transport
struct SimulatedTransport {
    remaining_failures: AtomicU32,
    failure_rate: f64,
}

impl SimulatedTransport {
    fn new(fail_first: u32, failure_rate: f64) -> Self {
        Self {
            remaining_failures: AtomicU32::new(fail_first),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn send(&self, payload: &Value, _headers: &Value) -> Result<(), TransportError> {
        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(TransportError::Unavailable(format!(
                "intentional failure (left={left})"
            )));
        }
        if rand::random::<f64>() < self.failure_rate {
            return Err(TransportError::Rejected("random failure".to_string()));
        }

        println!("delivered: seq={} at={}", payload["seq"], payload["recorded_at"]);
        Ok(())
    }
}

fn load_config(args: &Args) -> anyhow::Result<QueueConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            QueueConfig::from_json_str(&raw)?
        }
        None => QueueConfig::default(),
    };
    if let Some(max_queue_size) = args.max_queue_size {
        config = config.with_max_queue_size(max_queue_size);
    }
    if let Some(max_retry_count) = args.max_retry_count {
        config = config.with_max_retry_count(max_retry_count);
    }
    if let Some(ms) = args.retry_interval_ms {
        config = config.with_retry_interval(Duration::from_millis(ms));
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // (A) 設定とストア
    let config = load_config(&args)?;
    let store = FileStore::open(&args.store_dir)
        .await
        .with_context(|| format!("opening store at {}", args.store_dir.display()))?;
    info!(
        store_dir = %args.store_dir.display(),
        max_queue_size = config.max_queue_size,
        max_retry_count = config.max_retry_count,
        retry_interval_ms = config.retry_interval.as_millis() as u64,
        "configuration loaded"
    );

    // (B) コントローラを組み立てる（接続シグナルは任意）
    let transport = Arc::new(SimulatedTransport::new(args.fail_first, args.failure_rate));
    let mut builder = QueueBuilder::new(config)
        .store(Arc::new(store))
        .transport(transport);

    let mut simulated = None;
    let mut probe = None;
    if let Some(addr) = &args.probe_addr {
        let tcp = Arc::new(TcpProbeConnectivity::new(addr.clone(), Duration::from_secs(2)));
        tcp.probe().await;
        tcp.start_polling(Duration::from_secs(args.probe_every_secs.max(1)));
        builder = builder.connectivity(tcp.clone());
        probe = Some(tcp);
    } else if !args.no_connectivity {
        let watch = Arc::new(WatchConnectivity::new(args.offline_secs == 0));
        builder = builder.connectivity(watch.clone());
        simulated = Some(watch);
    }
    let controller = Arc::new(builder.build()?);

    // (C) 起動：前回の残りがあればここで送られる
    controller.start().await;

    if let Some(connectivity) = simulated.filter(|_| args.offline_secs > 0) {
        let offline = Duration::from_secs(args.offline_secs);
        tokio::spawn(async move {
            sleep(offline).await;
            info!("network is back");
            connectivity.set_connected(true);
        });
    }

    // (D) 位置イベントを投入
    let headers = json!({ "authorization": "Bearer demo-token" });
    for seq in 1..=args.events {
        let event = LocationEvent {
            device_id: "demo-device".to_string(),
            seq,
            lat: 35.68 + rand::random::<f64>() * 0.01,
            lng: 139.76 + rand::random::<f64>() * 0.01,
            recorded_at: Utc::now(),
        };
        let item_id = controller.enqueue_event(&event, headers.clone()).await?;
        info!(%item_id, seq, "location event queued");
        sleep(Duration::from_millis(args.event_interval_ms)).await;
    }

    // (E) キューが空になるまで待つ（Ctrl-C で中断）
    let linger = sleep(Duration::from_secs(args.linger_secs));
    tokio::pin!(linger);
    loop {
        if controller.status().await.is_settled() {
            break;
        }
        tokio::select! {
            _ = sleep(Duration::from_millis(500)) => {}
            _ = &mut linger => {
                warn!("queue did not settle before the linger timeout");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    controller.stop().await;
    if let Some(probe) = &probe {
        probe.stop_polling();
    }
    println!("{}", serde_json::to_string_pretty(&controller.status().await)?);
    Ok(())
}
