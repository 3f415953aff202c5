//! QueueState - 上限付き FIFO
//!
//! # 不変条件
//! - `len() <= capacity`
//! - 容量を超える場合は**最も古い**アイテムを先に追い出してから追加する
//! - 挿入順 = 処理順

use std::collections::VecDeque;

use super::QueueItem;

/// Bounded FIFO of pending items, newest-biased on overflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueState {
    items: VecDeque<QueueItem>,
    capacity: usize,
}

impl QueueState {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a state from a persisted sequence.
    ///
    /// Returns the state and the items that did not fit (oldest first).
    pub fn from_items(items: Vec<QueueItem>, capacity: usize) -> (Self, Vec<QueueItem>) {
        let mut state = Self {
            items: items.into(),
            capacity,
        };
        let evicted = state.enforce_capacity();
        (state, evicted)
    }

    /// Append an item, evicting from the front first if the queue is full.
    pub fn push(&mut self, item: QueueItem) -> Vec<QueueItem> {
        let mut evicted = Vec::new();
        while !self.items.is_empty() && self.items.len() >= self.capacity {
            if let Some(oldest) = self.items.pop_front() {
                evicted.push(oldest);
            }
        }
        self.items.push_back(item);
        evicted
    }

    /// Drop the oldest items until `len() <= capacity`.
    pub fn enforce_capacity(&mut self) -> Vec<QueueItem> {
        let overflow = self.items.len().saturating_sub(self.capacity);
        self.items.drain(..overflow).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<QueueItem> {
        self.items.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemId;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::json;
    use ulid::Ulid;

    fn item(n: u32) -> QueueItem {
        QueueItem::new(
            ItemId::from_ulid(Ulid::new()),
            json!({ "seq": n }),
            json!({}),
            Utc::now(),
        )
    }

    fn seqs(state: &QueueState) -> Vec<u64> {
        state
            .clone()
            .into_vec()
            .iter()
            .map(|item| item.payload["seq"].as_u64().unwrap())
            .collect()
    }

    #[test]
    fn push_below_capacity_keeps_everything() {
        let mut state = QueueState::with_capacity(3);
        assert!(state.push(item(1)).is_empty());
        assert!(state.push(item(2)).is_empty());
        assert_eq!(seqs(&state), vec![1, 2]);
    }

    #[test]
    fn push_at_capacity_evicts_oldest() {
        let mut state = QueueState::with_capacity(2);
        state.push(item(1));
        state.push(item(2));

        let evicted = state.push(item(3));

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].payload["seq"], 1);
        assert_eq!(seqs(&state), vec![2, 3]);
    }

    #[rstest]
    #[case::exact(5, 5)]
    #[case::one_over(5, 6)]
    #[case::many_over(5, 23)]
    #[case::capacity_one(1, 4)]
    fn length_never_exceeds_capacity(#[case] capacity: usize, #[case] pushes: u32) {
        let mut state = QueueState::with_capacity(capacity);
        for n in 1..=pushes {
            state.push(item(n));
            assert!(state.len() <= capacity);
        }

        // The newest `capacity` items survive, in order.
        let expected: Vec<u64> = (pushes.saturating_sub(capacity as u32) + 1..=pushes)
            .map(u64::from)
            .collect();
        assert_eq!(seqs(&state), expected);
    }

    #[test]
    fn from_items_trims_front() {
        let items = (1..=4).map(item).collect();
        let (state, evicted) = QueueState::from_items(items, 2);

        assert_eq!(seqs(&state), vec![3, 4]);
        assert_eq!(evicted.len(), 2);
        assert_eq!(evicted[0].payload["seq"], 1);
    }
}
