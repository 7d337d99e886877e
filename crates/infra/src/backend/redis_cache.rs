//! Redis-backed cache.
//!
//! Plain key/value over a multiplexed connection. Values are opaque bytes;
//! serialization happens in the repository so the cache stays format-blind.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use storefront_core::{Error, Op, Result};

use super::CacheStore;

/// Cache on a Redis connection manager. The manager reconnects on its own,
/// so a clone per call is cheap and failure-tolerant.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        const OP: Op = "redis_cache.connect";

        let client = redis::Client::open(url).map_err(|err| Error::internal(OP, err))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|err| Error::internal(OP, err))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        const OP: Op = "redis_cache.set";

        let mut conn = self.conn.clone();
        // EX rejects a zero expiry; clamp sub-second TTLs up to one second.
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|err| Error::internal(OP, err))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        const OP: Op = "redis_cache.get";

        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|err| Error::internal(OP, err))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        const OP: Op = "redis_cache.delete";

        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|err| Error::internal(OP, err))
    }

    async fn flush_all(&self) -> Result<()> {
        const OP: Op = "redis_cache.flush_all";

        let mut conn = self.conn.clone();
        redis::cmd("FLUSHALL")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|err| Error::internal(OP, err))
    }
}
