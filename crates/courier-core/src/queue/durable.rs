//! DurableQueue: the persisted pending-item list behind one store key.
//!
//! Design intent:
//! - Every read-modify-write happens under one short lock, never across a transport call.
//! - Read failures degrade to "empty queue", write failures to "try again later".
//!   Both are reported to the event sink and never returned to callers.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::domain::{CourierError, ItemId, QueueEvent, QueueItem, QueueState};
use crate::ports::{EventSink, KeyValueStore};

/// Result of appending one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub queue_len: usize,
    /// Items pushed out to make room, oldest first.
    pub evicted: Vec<ItemId>,
    pub persisted: bool,
}

/// Result of writing back a drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    pub remaining: usize,
    pub persisted: bool,
}

pub struct DurableQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
    sink: Arc<dyn EventSink>,
    io: Mutex<()>,
}

impl DurableQueue {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            sink,
            io: Mutex::new(()),
        }
    }

    /// Current persisted queue. Empty if nothing is stored or the read fails.
    pub async fn load(&self) -> Vec<QueueItem> {
        let _io = self.io.lock().await;
        self.read().await
    }

    /// Overwrite the persisted queue. `false` if the write failed.
    pub async fn save(&self, items: &[QueueItem]) -> bool {
        let _io = self.io.lock().await;
        self.write(items).await
    }

    /// Append `item`, evicting the oldest entries beyond `capacity`.
    pub async fn append(&self, item: QueueItem, capacity: usize) -> AppendOutcome {
        let _io = self.io.lock().await;

        let (mut state, mut evicted) = QueueState::from_items(self.read().await, capacity);
        evicted.extend(state.push(item));
        self.report_evicted(&evicted);

        let queue_len = state.len();
        let persisted = self.write(&state.into_vec()).await;
        AppendOutcome {
            queue_len,
            evicted: evicted.iter().map(|item| item.id).collect(),
            persisted,
        }
    }

    /// Persist the survivors of a drain pass in one write.
    ///
    /// `snapshot` holds the ids the pass loaded. The store is re-read so that:
    /// - items enqueued during the pass (ids not in `snapshot`) are kept, after the survivors;
    /// - survivors that were evicted or cleared during the pass stay gone.
    ///
    /// If the re-read fails the survivors are written alone.
    pub async fn commit_pass(
        &self,
        snapshot: &HashSet<ItemId>,
        survivors: Vec<QueueItem>,
        capacity: usize,
    ) -> CommitOutcome {
        let _io = self.io.lock().await;

        let merged: Vec<QueueItem> = match self.try_read().await {
            Ok(current) => {
                let present: HashSet<ItemId> = current.iter().map(|item| item.id).collect();
                let arrivals = current
                    .into_iter()
                    .filter(|item| !snapshot.contains(&item.id));
                survivors
                    .into_iter()
                    .filter(|item| present.contains(&item.id))
                    .chain(arrivals)
                    .collect()
            }
            Err(e) => {
                self.sink.emit(&QueueEvent::StoreReadFailed {
                    error: e.to_string(),
                });
                survivors
            }
        };

        let (state, evicted) = QueueState::from_items(merged, capacity);
        self.report_evicted(&evicted);

        let remaining = state.len();
        let persisted = self.write(&state.into_vec()).await;
        CommitOutcome {
            remaining,
            persisted,
        }
    }

    /// Forget every pending item.
    pub async fn clear(&self) -> bool {
        let _io = self.io.lock().await;
        match self.store.remove(&self.key).await {
            Ok(()) => true,
            Err(e) => {
                self.sink.emit(&QueueEvent::StoreWriteFailed {
                    error: e.to_string(),
                });
                false
            }
        }
    }

    async fn read(&self) -> Vec<QueueItem> {
        match self.try_read().await {
            Ok(items) => items,
            Err(e) => {
                self.sink.emit(&QueueEvent::StoreReadFailed {
                    error: e.to_string(),
                });
                Vec::new()
            }
        }
    }

    /// Entries that fail to decode are reported and purged from the store,
    /// so each one is reported once.
    async fn try_read(&self) -> Result<Vec<QueueItem>, CourierError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        let decoded = decode(&raw)?;
        if !decoded.malformed.is_empty() {
            for (index, error) in decoded.malformed {
                self.sink
                    .emit(&QueueEvent::MalformedEntryDropped { index, error });
            }
            self.write(&decoded.items).await;
        }
        Ok(decoded.items)
    }

    async fn write(&self, items: &[QueueItem]) -> bool {
        let result = match serde_json::to_string(items) {
            Ok(raw) => self
                .store
                .set(&self.key, raw)
                .await
                .map_err(CourierError::from),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                self.sink.emit(&QueueEvent::StoreWriteFailed {
                    error: e.to_string(),
                });
                false
            }
        }
    }

    fn report_evicted(&self, evicted: &[QueueItem]) {
        for item in evicted {
            self.sink.emit(&QueueEvent::Evicted {
                item_id: item.id,
                retry_count: item.retry_count,
            });
        }
    }
}

/// Decode the persisted JSON array.
///
/// A document that is not an array is an error. Single malformed entries are
/// skipped so one bad record does not take the whole queue down. Entries
/// written without an `id` get a stable derived one.
fn decode(raw: &str) -> Result<Decoded, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_str(raw)?;
    let mut items = Vec::with_capacity(entries.len());
    let mut malformed = Vec::new();

    for (index, mut entry) in entries.into_iter().enumerate() {
        if let Value::Object(fields) = &mut entry
            && !fields.contains_key("id")
        {
            let id = legacy_id(index, fields);
            fields.insert("id".to_string(), serde_json::to_value(id)?);
        }

        match serde_json::from_value::<QueueItem>(entry) {
            Ok(item) => items.push(item),
            Err(e) => malformed.push((index, e.to_string())),
        }
    }

    Ok(Decoded { items, malformed })
}

struct Decoded {
    items: Vec<QueueItem>,
    /// `(index, error)` of entries that did not decode.
    malformed: Vec<(usize, String)>,
}

fn legacy_id(index: usize, fields: &Map<String, Value>) -> ItemId {
    let timestamp_ms = fields
        .get("timestamp")
        .and_then(Value::as_u64)
        .unwrap_or_default();

    let mut hasher = DefaultHasher::new();
    index.hash(&mut hasher);
    for key in ["data", "headers"] {
        if let Some(value) = fields.get(key) {
            value.to_string().hash(&mut hasher);
        }
    }
    ItemId::derived(timestamp_ms, hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryStore, MemoryEventSink};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use ulid::Ulid;

    const KEY: &str = "test.queue";

    struct Fixture {
        store: Arc<InMemoryStore>,
        sink: Arc<MemoryEventSink>,
        queue: DurableQueue,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let sink = Arc::new(MemoryEventSink::new());
        let queue = DurableQueue::new(store.clone(), KEY, sink.clone());
        Fixture { store, sink, queue }
    }

    fn item(n: u32) -> QueueItem {
        QueueItem::new(
            ItemId::from_ulid(Ulid::new()),
            json!({ "seq": n }),
            json!({}),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn seqs(items: &[QueueItem]) -> Vec<u64> {
        items
            .iter()
            .map(|item| item.payload["seq"].as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn load_missing_key_is_empty() {
        let f = fixture();
        assert!(f.queue.load().await.is_empty());
        assert!(f.sink.events().is_empty());
    }

    #[tokio::test]
    async fn load_read_failure_is_empty_and_reported() {
        let f = fixture();
        f.queue.save(&[item(1)]).await;
        f.store.fail_reads(true);

        assert!(f.queue.load().await.is_empty());
        assert_eq!(f.sink.named("store_read_failed").len(), 1);
    }

    #[tokio::test]
    async fn load_corrupt_document_is_empty() {
        let f = fixture();
        f.store.insert_raw(KEY, "{not json").await;

        assert!(f.queue.load().await.is_empty());
        assert_eq!(f.sink.named("store_read_failed").len(), 1);
    }

    #[tokio::test]
    async fn load_skips_malformed_entries() {
        let f = fixture();
        let good = item(1);
        let doc = json!([good, {"data": 1}, "garbage"]).to_string();
        f.store.insert_raw(KEY, doc).await;

        let items = f.queue.load().await;
        assert_eq!(items, vec![good.clone()]);

        let dropped = f.sink.named("malformed_entry_dropped");
        assert_eq!(dropped.len(), 2);
        assert!(matches!(
            dropped[0],
            QueueEvent::MalformedEntryDropped { index: 1, .. }
        ));

        // purged on the first read, so a second read reports nothing new
        assert_eq!(f.queue.load().await, vec![good]);
        assert_eq!(f.sink.named("malformed_entry_dropped").len(), 2);
    }

    #[tokio::test]
    async fn entries_without_id_get_stable_ids() {
        let f = fixture();
        let doc = json!([
            {"data": {"seq": 1}, "headers": {}, "timestamp": 1_700_000_000_000_u64, "retryCount": 1},
            {"data": {"seq": 2}, "headers": {}, "timestamp": 1_700_000_000_500_u64, "retryCount": 0},
        ])
        .to_string();
        f.store.insert_raw(KEY, doc).await;

        let first = f.queue.load().await;
        let second = f.queue.load().await;

        assert_eq!(seqs(&first), vec![1, 2]);
        assert_eq!(first[0].retry_count, 1);
        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, first[1].id);
    }

    #[tokio::test]
    async fn save_failure_is_reported_and_keeps_old_state() {
        let f = fixture();
        assert!(f.queue.save(&[item(1)]).await);

        f.store.fail_writes(true);
        assert!(!f.queue.save(&[item(2), item(3)]).await);
        f.store.fail_writes(false);

        assert_eq!(seqs(&f.queue.load().await), vec![1]);
        assert_eq!(f.sink.named("store_write_failed").len(), 1);
    }

    #[tokio::test]
    async fn append_evicts_oldest_and_reports() {
        let f = fixture();
        f.queue.append(item(1), 2).await;
        f.queue.append(item(2), 2).await;
        let outcome = f.queue.append(item(3), 2).await;

        assert_eq!(outcome.queue_len, 2);
        assert_eq!(outcome.evicted.len(), 1);
        assert!(outcome.persisted);
        assert_eq!(seqs(&f.queue.load().await), vec![2, 3]);
        assert_eq!(f.sink.named("evicted").len(), 1);
    }

    #[tokio::test]
    async fn commit_keeps_items_enqueued_during_pass() {
        let f = fixture();
        let a = item(1);
        let b = item(2);
        f.queue.save(&[a.clone(), b.clone()]).await;
        let snapshot: HashSet<ItemId> = [a.id, b.id].into();

        // arrives while the pass is sending
        f.queue.append(item(3), 10).await;

        // pass delivered `a`, `b` failed once
        let mut b_failed = b.clone();
        b_failed.retry_count = 1;
        let outcome = f.queue.commit_pass(&snapshot, vec![b_failed], 10).await;

        let items = f.queue.load().await;
        assert_eq!(seqs(&items), vec![2, 3]);
        assert_eq!(items[0].retry_count, 1);
        assert_eq!(outcome.remaining, 2);
        assert!(outcome.persisted);
    }

    #[tokio::test]
    async fn commit_does_not_resurrect_evicted_items() {
        let f = fixture();
        let a = item(1);
        f.queue.save(&[a.clone()]).await;
        let snapshot: HashSet<ItemId> = [a.id].into();

        // capacity 1: this enqueue evicts `a` mid-pass
        f.queue.append(item(2), 1).await;

        let outcome = f.queue.commit_pass(&snapshot, vec![a], 1).await;
        assert_eq!(seqs(&f.queue.load().await), vec![2]);
        assert_eq!(outcome.remaining, 1);
    }

    #[tokio::test]
    async fn commit_with_failed_reread_writes_survivors() {
        let f = fixture();
        let a = item(1);
        f.queue.save(&[a.clone()]).await;
        let snapshot: HashSet<ItemId> = [a.id].into();

        f.store.fail_reads(true);
        let outcome = f.queue.commit_pass(&snapshot, vec![a], 10).await;
        f.store.fail_reads(false);

        assert_eq!(outcome.remaining, 1);
        assert_eq!(seqs(&f.queue.load().await), vec![1]);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let f = fixture();
        f.queue.save(&[item(1)]).await;
        assert!(f.queue.clear().await);
        assert!(f.queue.load().await.is_empty());
        assert_eq!(f.store.raw(KEY).await, None);
    }
}
