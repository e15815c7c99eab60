//! Fault-injecting [`StoreClient`] wrapper.
//!
//! [`FaultyStore`] forwards every call to an inner store unless a fault is
//! armed for that operation, in which case the call fails without reaching the
//! inner store. Used to exercise the engine's partial-write paths.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hashmodel_core::Fields;
use parking_lot::Mutex;

use super::StoreClient;

/// Store operations that can be failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    HashSet,
    HashGetAll,
    ListPush,
    ListLen,
    ListRange,
    ListRemove,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HashSet => "hash_set",
            Self::HashGetAll => "hash_get_all",
            Self::ListPush => "list_push",
            Self::ListLen => "list_len",
            Self::ListRange => "list_range",
            Self::ListRemove => "list_remove",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// How many more times an armed operation fails. `None` = until healed.
type Remaining = Option<u32>;

/// Wraps a store and fails armed operations.
pub struct FaultyStore {
    inner: Arc<dyn StoreClient>,
    plan: Mutex<HashMap<StoreOp, Remaining>>,
    calls: AtomicU64,
    injected: AtomicU64,
}

impl FaultyStore {
    /// Wraps `inner` with no faults armed.
    #[must_use]
    pub fn new(inner: Arc<dyn StoreClient>) -> Self {
        Self {
            inner,
            plan: Mutex::new(HashMap::new()),
            calls: AtomicU64::new(0),
            injected: AtomicU64::new(0),
        }
    }

    /// Fail every call to `op` until [`heal`](Self::heal) is called.
    pub fn fail_always(&self, op: StoreOp) {
        self.plan.lock().insert(op, None);
    }

    /// Fail the next `times` calls to `op`.
    pub fn fail_times(&self, op: StoreOp, times: u32) {
        if times > 0 {
            self.plan.lock().insert(op, Some(times));
        }
    }

    /// Disarm any fault on `op`.
    pub fn heal(&self, op: StoreOp) {
        self.plan.lock().remove(&op);
    }

    /// Total calls received, including failed ones.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of calls failed by an armed fault.
    #[must_use]
    pub fn injected(&self) -> u64 {
        self.injected.load(Ordering::Relaxed)
    }

    /// Counts the call and returns an error if `op` is armed.
    fn check(&self, op: StoreOp, key: &str) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let mut plan = self.plan.lock();
        let Some(remaining) = plan.get_mut(&op) else {
            return Ok(());
        };
        if let Some(left) = remaining {
            *left -= 1;
            if *left == 0 {
                plan.remove(&op);
            }
        }
        drop(plan);

        self.injected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(op = %op, key = %key, "injecting store fault");
        Err(anyhow::anyhow!("injected fault: {op} on `{key}`"))
    }
}

#[async_trait]
impl StoreClient for FaultyStore {
    async fn hash_set(&self, key: &str, fields: &Fields) -> anyhow::Result<()> {
        self.check(StoreOp::HashSet, key)?;
        self.inner.hash_set(key, fields).await
    }

    async fn hash_get_all(&self, key: &str) -> anyhow::Result<Fields> {
        self.check(StoreOp::HashGetAll, key)?;
        self.inner.hash_get_all(key).await
    }

    async fn list_push(&self, key: &str, value: &str) -> anyhow::Result<u64> {
        self.check(StoreOp::ListPush, key)?;
        self.inner.list_push(key, value).await
    }

    async fn list_len(&self, key: &str) -> anyhow::Result<u64> {
        self.check(StoreOp::ListLen, key)?;
        self.inner.list_len(key).await
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> anyhow::Result<Vec<String>> {
        self.check(StoreOp::ListRange, key)?;
        self.inner.list_range(key, start, stop).await
    }

    async fn list_remove(&self, key: &str, count: i64, value: &str) -> anyhow::Result<u64> {
        self.check(StoreOp::ListRemove, key)?;
        self.inner.list_remove(key, count, value).await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        self.check(StoreOp::Delete, key)?;
        self.inner.delete(key).await
    }
}
