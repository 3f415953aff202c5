//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore** / **FileStore**: KeyValueStore
//! - **WatchConnectivity** / **TcpProbeConnectivity**: Connectivity
//! - **TracingEventSink** / **MemoryEventSink** / **NoopEventSink**: EventSink
//! - **ScriptedTransport**: 開発・テスト用の Transport
//!
//! 本番の Transport（HTTP クライアントなど）はホスト側で実装します。

pub mod file_store;
pub mod memory_sink;
pub mod memory_store;
pub mod scripted_transport;
pub mod tcp_probe;
pub mod tracing_sink;
pub mod watch_connectivity;

// 主要な型を再エクスポート
pub use self::file_store::FileStore;
pub use self::memory_sink::{MemoryEventSink, NoopEventSink};
pub use self::memory_store::InMemoryStore;
pub use self::scripted_transport::{ScriptedTransport, Step};
pub use self::tcp_probe::TcpProbeConnectivity;
pub use self::tracing_sink::TracingEventSink;
pub use self::watch_connectivity::WatchConnectivity;
