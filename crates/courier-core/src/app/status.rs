//! Status - コントローラの状態スナップショット

use serde::{Deserialize, Serialize};

use crate::app::scheduler::SchedulerState;
use crate::observability::DeliveryCounts;

/// Point-in-time view returned by `QueueController::status`.
///
/// # 使用例
/// ```ignore
/// let status = controller.status().await;
/// println!("{}", serde_json::to_string_pretty(&status)?);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub running: bool,
    pub draining: bool,
    pub scheduler: SchedulerState,
    pub pending: usize,
    pub counts: DeliveryCounts,
}

impl QueueStatus {
    /// Nothing pending and nothing in flight.
    pub fn is_settled(&self) -> bool {
        self.pending == 0 && !self.draining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_scheduler_state() {
        let status = QueueStatus {
            running: true,
            draining: false,
            scheduler: SchedulerState::RetryArmed,
            pending: 2,
            counts: DeliveryCounts::default(),
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["scheduler"], "retry_armed");
        assert_eq!(value["pending"], 2);
        assert!(!status.is_settled());
    }
}
