//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて配送キューのロジックを実装します。
//!
//! # 主要コンポーネント
//! - **QueueBuilder**: コントローラの構築とワイヤリング
//! - **QueueController**: ホスト向けの公開 API（start / stop / enqueue / flush_now）
//! - **DeliveryWorker**: ドレインパス（load→send→retry/drop→commit）
//! - **RetryScheduler**: 再送タイマーと接続回復トリガー

pub mod builder;
pub mod controller;
pub mod scheduler;
pub mod status;
pub mod worker;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, QueueBuilder};
pub use self::controller::QueueController;
pub use self::scheduler::{RetryScheduler, SchedulerState};
pub use self::status::QueueStatus;
pub use self::worker::{DeliveryWorker, DrainOutcome, DrainReport};
