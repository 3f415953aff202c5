//! Domain identifiers.
//!
//! # ULID ベースの ID
//! キューに積まれたアイテムは ULID (Universally Unique Lexicographically Sortable Identifier)
//! で識別します。
//!
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **分散生成可能**: 調整なしで複数プロセスで生成できる
//! - 永続化フォーマットでは素の文字列（`"01J..."`）として表現する

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one queued item.
///
/// Display uses the `item-` prefix so ids are easy to grep in logs; the
/// persisted form is the bare ULID string.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Ulid);

impl ItemId {
    /// ULID から ItemId を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }

    /// Derive a stable id for a persisted entry that was written without one.
    ///
    /// The same `(timestamp_ms, fingerprint)` pair always yields the same id, so
    /// repeated loads of an untouched store agree with each other.
    pub fn derived(timestamp_ms: u64, fingerprint: u64) -> Self {
        Self(Ulid::from_parts(timestamp_ms, u128::from(fingerprint)))
    }
}

impl From<Ulid> for ItemId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_item_prefix() {
        let id = ItemId::from_ulid(Ulid::new());
        assert!(id.to_string().starts_with("item-"));
    }

    #[test]
    fn serializes_as_bare_ulid_string() {
        let ulid = Ulid::new();
        let id = ItemId::from(ulid);

        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(ulid.to_string()));

        let back: ItemId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn derived_ids_are_stable() {
        let a = ItemId::derived(1_700_000_000_000, 42);
        let b = ItemId::derived(1_700_000_000_000, 42);
        let c = ItemId::derived(1_700_000_000_000, 43);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_ulid().timestamp_ms(), 1_700_000_000_000);
    }
}
