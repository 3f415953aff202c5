//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（ストレージ、サーバ、ネットワーク状態）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - 永続化されたキューが source of truth（正本）
//! - 送信とネットワーク観測はホスト側の協調者
//! - ネットワーク観測は存在しないこともある（`NetworkCapability::Absent`）

pub mod clock;
pub mod connectivity;
pub mod event_sink;
pub mod id_generator;
pub mod store;
pub mod transport;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::connectivity::{Connectivity, NetworkCapability, RegainedEvents};
pub use self::event_sink::{EventSink, FanoutSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::store::{KeyValueStore, StoreError};
pub use self::transport::{Transport, TransportError};
