//! Retry policy: decides whether a failed item is kept or dropped.

use std::time::Duration;

use crate::config::QueueConfig;
use crate::domain::QueueItem;

/// What to do with an item after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep it for the next pass. Carries the new retry count.
    Retry { retry_count: u32 },
    /// Retry budget exhausted.
    Drop,
}

/// Retry policy for failed deliveries.
///
/// Retries are not scheduled per item: one timer re-runs the whole queue after
/// `interval`, so this only decides keep-or-drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retry_count: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retry_count: u32, interval: Duration) -> Self {
        Self {
            max_retry_count,
            interval,
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.max_retry_count, config.retry_interval)
    }

    /// Apply one failed attempt to `item`.
    ///
    /// An item that already used its whole budget is dropped without being
    /// incremented; otherwise `retry_count` goes up by exactly one.
    ///
    /// With `max_retry_count = 3`:
    /// - retry_count 0 → Retry(1)
    /// - retry_count 2 → Retry(3)
    /// - retry_count 3 → Drop (the 4th failed attempt)
    pub fn on_failure(&self, item: &mut QueueItem) -> RetryDecision {
        if item.retry_count >= self.max_retry_count {
            return RetryDecision::Drop;
        }
        item.record_failure();
        RetryDecision::Retry {
            retry_count: item.retry_count,
        }
    }

    /// Items above the budget must not be attempted again (e.g. after the
    /// limit was lowered between runs).
    pub fn exceeds_budget(&self, item: &QueueItem) -> bool {
        item.retry_count > self.max_retry_count
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}
