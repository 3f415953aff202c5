//! Queue module: durable storage of pending items and the retry policy.

mod durable;
mod retry;

pub use durable::{AppendOutcome, CommitOutcome, DurableQueue};
pub use retry::{RetryDecision, RetryPolicy};
