//! Store client seam for the mapping engine.
//!
//! [`StoreClient`] is the capability set the engine consumes from a remote
//! key-value store with hash and list primitives. Every method is a single
//! request that the store executes atomically for its key; the engine never
//! assumes atomicity across keys.
//!
//! Implementations:
//!
//! - [`MemoryStore`]: in-process store with Redis semantics, for tests and demos
//! - [`FaultyStore`]: wrapper that fails selected operations on demand
//! - `RedisStore` (feature `redis`): a real Redis connection

use async_trait::async_trait;
use hashmodel_core::Fields;

pub mod fault;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use fault::{FaultyStore, StoreOp};
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Asynchronous hash + list capability set of the backing store.
///
/// Used as `Arc<dyn StoreClient>`. Index arguments follow Redis conventions:
/// ranges are inclusive on both ends and negative indices count from the tail.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Set every field of `fields` on the hash at `key`, creating it if needed.
    async fn hash_set(&self, key: &str, fields: &Fields) -> anyhow::Result<()>;

    /// All fields of the hash at `key`. Empty if the key does not exist.
    async fn hash_get_all(&self, key: &str) -> anyhow::Result<Fields>;

    /// Push `value` onto the head of the list at `key`. Returns the new length.
    async fn list_push(&self, key: &str, value: &str) -> anyhow::Result<u64>;

    /// Length of the list at `key`; 0 if the key does not exist.
    async fn list_len(&self, key: &str) -> anyhow::Result<u64>;

    /// Elements `start..=stop` of the list at `key`, clamped to its bounds.
    async fn list_range(&self, key: &str, start: i64, stop: i64) -> anyhow::Result<Vec<String>>;

    /// Remove occurrences of `value` from the list at `key`.
    ///
    /// `count > 0` removes up to `count` from the head, `count < 0` up to
    /// `|count|` from the tail, `0` removes all. Returns the number removed.
    async fn list_remove(&self, key: &str, count: i64, value: &str) -> anyhow::Result<u64>;

    /// Delete `key`. Returns 1 if a key was removed, 0 otherwise.
    async fn delete(&self, key: &str) -> anyhow::Result<u64>;
}
