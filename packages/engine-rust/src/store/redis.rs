//! [`StoreClient`] backed by a Redis server.
//!
//! Uses one multiplexed connection opened at construction and shared by every
//! call; the connection handle is cloned per request, which only clones the
//! sender half of the multiplexer.

use std::collections::HashMap;

use ::redis::aio::MultiplexedConnection;
use ::redis::AsyncCommands;
use async_trait::async_trait;
use hashmodel_core::Fields;

use super::StoreClient;
use crate::config::StoreConfig;

/// Converts a Redis integer reply into a count.
fn count(reply: i64) -> u64 {
    u64::try_from(reply).unwrap_or(0)
}

/// Redis-backed hash + list store.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Opens a multiplexed connection to the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable or
    /// rejects authentication.
    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        if !config.keep_alive {
            tracing::warn!(
                host = %config.host,
                "keep_alive = false is not honoured; the redis client always enables TCP keep-alive"
            );
        }
        let client = ::redis::Client::open(config.connection_url())?;
        let connection = client.get_multiplexed_async_connection().await?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = config.database,
            "connected to redis"
        );
        Ok(Self { connection })
    }

    /// Wraps an already established connection.
    #[must_use]
    pub fn from_connection(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    async fn hash_set(&self, key: &str, fields: &Fields) -> anyhow::Result<()> {
        let pairs: Vec<(&str, &str)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let mut conn = self.connection.clone();
        let _: () = conn.hset_multiple(key, pairs.as_slice()).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> anyhow::Result<Fields> {
        let mut conn = self.connection.clone();
        let hash: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(hash.into_iter().collect())
    }

    async fn list_push(&self, key: &str, value: &str) -> anyhow::Result<u64> {
        let mut conn = self.connection.clone();
        let len: i64 = conn.lpush(key, value).await?;
        Ok(count(len))
    }

    async fn list_len(&self, key: &str) -> anyhow::Result<u64> {
        let mut conn = self.connection.clone();
        let len: i64 = conn.llen(key).await?;
        Ok(count(len))
    }

    async fn list_range(&self, key: &str, start: i64, stop: i64) -> anyhow::Result<Vec<String>> {
        let start = isize::try_from(start)?;
        let stop = isize::try_from(stop)?;
        let mut conn = self.connection.clone();
        let items: Vec<String> = conn.lrange(key, start, stop).await?;
        Ok(items)
    }

    async fn list_remove(&self, key: &str, count_arg: i64, value: &str) -> anyhow::Result<u64> {
        let count_arg = isize::try_from(count_arg)?;
        let mut conn = self.connection.clone();
        let removed: i64 = conn.lrem(key, count_arg, value).await?;
        Ok(count(removed))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<u64> {
        let mut conn = self.connection.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(count(removed))
    }
}
