//! In-process [`StoreClient`] implementation backed by [`DashMap`].
//!
//! Mirrors the Redis semantics the engine relies on: wrong-type access fails,
//! list ranges are inclusive and clamp out-of-range bounds, and a list or hash
//! that becomes empty disappears. Each call locks only the shard of the key it
//! touches, so single-key operations are atomic like their Redis counterparts.

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;
use hashmodel_core::Fields;

use super::StoreClient;

/// Value stored under one key.
#[derive(Debug, Clone)]
enum StoredValue {
    Hash(Fields),
    List(VecDeque<String>),
}

impl StoredValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Hash(_) => "hash",
            Self::List(_) => "list",
        }
    }
}

fn wrong_type(key: &str, found: &'static str) -> anyhow::Error {
    anyhow::anyhow!("WRONGTYPE operation against key `{key}` holding a {found}")
}

/// Resolves an inclusive, possibly negative `start..=stop` range against a
/// list of `len` elements. Returns `None` when the range selects nothing.
fn clamp_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    if len == 0 {
        return None;
    }
    let start = if start < 0 {
        start.saturating_add(len).max(0)
    } else {
        start
    };
    let stop = if stop < 0 {
        stop.saturating_add(len)
    } else {
        stop.min(len - 1)
    };
    if start > stop || start >= len {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(stop).ok()?))
}

/// In-memory hash + list store.
///
/// Cheap to construct; each instance is an isolated keyspace.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Whether `key` currently exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of all keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn hash_set(&self, key: &str, fields: &Fields) -> anyhow::Result<()> {
        if fields.is_empty() {
            anyhow::bail!("hash_set on `{key}` requires at least one field");
        }
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::Hash(Fields::new()));
        match entry.value_mut() {
            StoredValue::Hash(hash) => {
                hash.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(())
            }
            other => Err(wrong_type(key, other.kind())),
        }
    }

    async fn hash_get_all(&self, key: &str) -> anyhow::Result<Fields> {
        match self.entries.get(key).as_deref() {
            None => Ok(Fields::new()),
            Some(StoredValue::Hash(hash)) => Ok(hash.clone()),
            Some(other) => Err(wrong_type(key, other.kind())),
        }
    }

    async fn list_push(&self, key: &str, value: &str) -> anyhow::Result<u64> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::List(VecDeque::new()));
        match entry.value_mut() {
            StoredValue::List(list) => {
                list.push_front(value.to_string());
                Ok(list.len() as u64)
            }
            other => Err(wrong_type(key, other.kind())),
        }
    }

    async fn list_len(&self, key: &str) -> anyhow::Result<u64> {
        match self.entries.get(key).as_deref() {
            None => Ok(0),
            Some(StoredValue::List(list)) => Ok(list.len() as u64),
            Some(other) => Err(wrong_type(key, other.kind())),
        }
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> anyhow::Result<Vec<String>> {
        match self.entries.get(key).as_deref() {
            None => Ok(Vec::new()),
            Some(StoredValue::List(list)) => Ok(match clamp_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(other) => Err(wrong_type(key, other.kind())),
        }
    }

    async fn list_remove(&self, key: &str, count: i64, value: &str) -> anyhow::Result<u64> {
        let removed = {
            let Some(mut entry) = self.entries.get_mut(key) else {
                return Ok(0);
            };
            let list = match entry.value_mut() {
                StoredValue::List(list) => list,
                other => return Err(wrong_type(key, other.kind())),
            };

            let limit = if count == 0 {
                usize::MAX
            } else {
                usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX)
            };
            let mut removed = 0_usize;
            if count >= 0 {
                list.retain(|item| {
                    if removed < limit && item == value {
                        removed += 1;
                        false
                    } else {
                        true
                    }
                });
            } else {
                let mut kept = VecDeque::with_capacity(list.len());
                for item in list.drain(..).rev() {
                    if removed < limit && item == value {
                        removed += 1;
                    } else {
                        kept.push_front(item);
                    }
                }
                *list = kept;
            }
            removed
        };

        self.entries
            .remove_if(key, |_, v| matches!(v, StoredValue::List(list) if list.is_empty()));
        Ok(removed as u64)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        Ok(u64::from(self.entries.remove(key).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    async fn list_of(store: &MemoryStore, key: &str, items: &[&str]) {
        // Pushing in reverse leaves `items` in head-to-tail order.
        for item in items.iter().rev() {
            store.list_push(key, item).await.unwrap();
        }
    }

    #[tokio::test]
    async fn hash_set_then_get_all() {
        let store = MemoryStore::new();
        store
            .hash_set("h", &fields(&[("a", "1"), ("b", "2")]))
            .await
            .unwrap();
        store.hash_set("h", &fields(&[("b", "3")])).await.unwrap();

        let got = store.hash_get_all("h").await.unwrap();
        assert_eq!(got, fields(&[("a", "1"), ("b", "3")]));
    }

    #[tokio::test]
    async fn hash_get_all_missing_key_is_empty() {
        let store = MemoryStore::new();
        assert!(store.hash_get_all("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hash_set_rejects_empty_payload() {
        let store = MemoryStore::new();
        assert!(store.hash_set("h", &Fields::new()).await.is_err());
        assert!(!store.contains_key("h"));
    }

    #[tokio::test]
    async fn list_push_prepends_and_reports_length() {
        let store = MemoryStore::new();
        assert_eq!(store.list_push("l", "a").await.unwrap(), 1);
        assert_eq!(store.list_push("l", "b").await.unwrap(), 2);
        assert_eq!(store.list_range("l", 0, -1).await.unwrap(), vec!["b", "a"]);
        assert_eq!(store.list_len("l").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_len_missing_key_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.list_len("l").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_range_is_inclusive_and_clamped() {
        let store = MemoryStore::new();
        list_of(&store, "l", &["a", "b", "c", "d", "e"]).await;

        assert_eq!(store.list_range("l", 0, 1).await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.list_range("l", 3, 100).await.unwrap(), vec!["d", "e"]);
        assert_eq!(store.list_range("l", -2, -1).await.unwrap(), vec!["d", "e"]);
        assert_eq!(store.list_range("l", -100, 0).await.unwrap(), vec!["a"]);
        assert!(store.list_range("l", 5, 10).await.unwrap().is_empty());
        assert!(store.list_range("l", 3, 1).await.unwrap().is_empty());
        assert!(store.list_range("l", 0, -6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_remove_from_head_and_tail() {
        let store = MemoryStore::new();
        list_of(&store, "l", &["x", "a", "x", "b", "x"]).await;

        assert_eq!(store.list_remove("l", 1, "x").await.unwrap(), 1);
        assert_eq!(
            store.list_range("l", 0, -1).await.unwrap(),
            vec!["a", "x", "b", "x"]
        );

        assert_eq!(store.list_remove("l", -1, "x").await.unwrap(), 1);
        assert_eq!(store.list_range("l", 0, -1).await.unwrap(), vec!["a", "x", "b"]);

        assert_eq!(store.list_remove("l", 0, "x").await.unwrap(), 1);
        assert_eq!(store.list_range("l", 0, -1).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn list_remove_missing_value_or_key_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.list_remove("l", 1, "x").await.unwrap(), 0);
        list_of(&store, "l", &["a"]).await;
        assert_eq!(store.list_remove("l", 1, "x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn emptied_list_disappears() {
        let store = MemoryStore::new();
        list_of(&store, "l", &["a"]).await;
        store.list_remove("l", 1, "a").await.unwrap();
        assert!(!store.contains_key("l"));
        assert_eq!(store.key_count(), 0);
    }

    #[tokio::test]
    async fn delete_reports_whether_key_existed() {
        let store = MemoryStore::new();
        store.hash_set("h", &fields(&[("a", "1")])).await.unwrap();
        assert_eq!(store.delete("h").await.unwrap(), 1);
        assert_eq!(store.delete("h").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_type_access_fails() {
        let store = MemoryStore::new();
        store.hash_set("h", &fields(&[("a", "1")])).await.unwrap();
        list_of(&store, "l", &["a"]).await;

        let err = store.list_push("h", "x").await.unwrap_err();
        assert!(err.to_string().starts_with("WRONGTYPE"));
        assert!(store.list_len("h").await.is_err());
        assert!(store.list_range("h", 0, -1).await.is_err());
        assert!(store.list_remove("h", 1, "a").await.is_err());
        assert!(store.hash_get_all("l").await.is_err());
        assert!(store.hash_set("l", &fields(&[("a", "1")])).await.is_err());
    }

    #[test]
    fn clamp_range_matches_redis_lrange() {
        assert_eq!(clamp_range(0, 0, -1), None);
        assert_eq!(clamp_range(3, 0, 3), Some((0, 2)));
        assert_eq!(clamp_range(3, 0, 0), Some((0, 0)));
        assert_eq!(clamp_range(3, -1, -1), Some((2, 2)));
        assert_eq!(clamp_range(3, 2, 1), None);
        assert_eq!(clamp_range(3, 3, 5), None);
    }

    proptest::proptest! {
        #[test]
        fn clamp_range_selects_resolved_indices(len in 0usize..20, start in -25i64..25, stop in -25i64..25) {
            let signed_len = i64::try_from(len).unwrap();
            let resolve = |index: i64| if index < 0 { index + signed_len } else { index };
            let expected: Vec<usize> = (0..len)
                .filter(|i| {
                    let i = i64::try_from(*i).unwrap();
                    resolve(start) <= i && i <= resolve(stop)
                })
                .collect();

            let actual: Vec<usize> = match clamp_range(len, start, stop) {
                Some((first, last)) => (first..=last).collect(),
                None => Vec::new(),
            };
            proptest::prop_assert_eq!(actual, expected);
        }
    }

    #[tokio::test]
    async fn keys_snapshot_is_sorted() {
        let store = MemoryStore::new();
        list_of(&store, "b", &["x"]).await;
        store.hash_set("a", &fields(&[("f", "v")])).await.unwrap();
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
