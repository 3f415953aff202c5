//! Queue configuration.
//!
//! All fields have defaults, so an empty JSON object (`{}`) is a valid config.
//!
//! | field | default |
//! |-------|---------|
//! | `max_queue_size` | 50 |
//! | `max_retry_count` | 3 |
//! | `retry_interval_ms` | 30000 |
//! | `storage_key` | `courier.location_queue` |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_QUEUE_SIZE: usize = 50;
pub const DEFAULT_MAX_RETRY_COUNT: u32 = 3;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_STORAGE_KEY: &str = "courier.location_queue";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_queue_size must be at least 1")]
    ZeroQueueSize,

    #[error("retry_interval_ms must be greater than zero")]
    ZeroRetryInterval,

    #[error("storage_key must not be empty")]
    EmptyStorageKey,

    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Upper bound on pending items; the oldest is evicted on overflow.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Failed attempts an item may accumulate before it is dropped.
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,

    #[serde(
        rename = "retry_interval_ms",
        default = "default_retry_interval",
        with = "duration_ms"
    )]
    pub retry_interval: Duration,

    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_max_queue_size() -> usize {
    DEFAULT_MAX_QUEUE_SIZE
}

fn default_max_retry_count() -> u32 {
    DEFAULT_MAX_RETRY_COUNT
}

fn default_retry_interval() -> Duration {
    DEFAULT_RETRY_INTERVAL
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_max_queue_size(),
            max_retry_count: default_max_retry_count(),
            retry_interval: default_retry_interval(),
            storage_key: default_storage_key(),
        }
    }
}

impl QueueConfig {
    /// Parse a JSON config document. Missing fields fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_queue_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        if self.retry_interval.is_zero() {
            return Err(ConfigError::ZeroRetryInterval);
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }

    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    pub fn with_max_retry_count(mut self, max_retry_count: u32) -> Self {
        self.max_retry_count = max_retry_count;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
