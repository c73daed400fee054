use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::cache::entry::CacheEntry;
use crate::cache::store::{CacheError, KeyValueStore};

/// Redis backend. `ConnectionManager` reconnects on its own and is cheap to
/// clone, so every call works on its own handle.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, entry: CacheEntry) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(entry.key()).await?;
        Ok(value)
    }

    async fn set_with_expiry(&self, entry: CacheEntry, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero lifetime and one whose expiry overflows in millis
        let seconds = ttl.as_secs().clamp(1, i64::MAX as u64 / 1000);
        let _: () = conn.set_ex(entry.key(), value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(entry.key()).await?;
        Ok(())
    }
}
