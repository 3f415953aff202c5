//! Errors - エラー型と分類
//!
//! 実行時のエラー（永続化・配送）はキュー内部で回復し、ホストには伝播しません。
//! ホストに返るのは構築時の設定エラーと payload のシリアライズエラーのみです。

use thiserror::Error;

use crate::config::ConfigError;
use crate::ports::{StoreError, TransportError};

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type Result<T, E = CourierError> = std::result::Result<T, E>;
