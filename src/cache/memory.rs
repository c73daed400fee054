use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::cache::entry::CacheEntry;
use crate::cache::store::{CacheError, KeyValueStore};

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at_ms: i64, // UNIX millis
}

impl StoredValue {
    fn is_live(&self) -> bool {
        Utc::now().timestamp_millis() < self.expires_at_ms
    }
}

/// In-process store with the same contract as the redis backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<CacheEntry, StoredValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.values().filter(|v| v.is_live()).count()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, entry: CacheEntry) -> Result<Option<String>, CacheError> {
        {
            let map = self.inner.read().await;
            match map.get(&entry) {
                None => return Ok(None),
                Some(stored) if stored.is_live() => return Ok(Some(stored.value.clone())),
                Some(_) => {}
            }
        }
        // expired: drop it so the map does not grow stale
        let mut map = self.inner.write().await;
        if map.get(&entry).is_some_and(|stored| !stored.is_live()) {
            map.remove(&entry);
        }
        Ok(None)
    }

    async fn set_with_expiry(&self, entry: CacheEntry, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at_ms = Utc::now().timestamp_millis().saturating_add(ttl_ms);
        let mut map = self.inner.write().await;
        map.insert(
            entry,
            StoredValue {
                value: value.to_owned(),
                expires_at_ms,
            },
        );
        Ok(())
    }

    async fn delete(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.inner.write().await.remove(&entry);
        Ok(())
    }
}
