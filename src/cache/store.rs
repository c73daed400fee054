use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::cache::entry::CacheEntry;
use crate::cache::memory::MemoryStore;
use crate::cache::redis_store::RedisStore;
use crate::observability::metrics::get_metrics;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("unsupported cache url '{0}', expected redis://, rediss:// or memory://")]
    UnsupportedUrl(String),
    #[error("cache backend error: {0}")]
    Backend(#[from] ::redis::RedisError),
    #[error("cached value for '{entry}' is not valid json: {source}")]
    Decode {
        entry: CacheEntry,
        #[source]
        source: serde_json::Error,
    },
    #[error("value for '{entry}' could not be encoded: {source}")]
    Encode {
        entry: CacheEntry,
        #[source]
        source: serde_json::Error,
    },
}

/// Opaque key-value store with per-key expiry.
///
/// Every operation is a single-key atomic call; callers compose them and
/// never hold a lock across calls.
pub trait KeyValueStore {
    fn get(&self, entry: CacheEntry) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;

    fn set_with_expiry(
        &self,
        entry: CacheEntry,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    fn delete(&self, entry: CacheEntry) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Backend selected from the cache connection string.
#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl Store {
    /// Connect to the backend named by `url`. Redis connections are
    /// established eagerly so a bad url fails at startup.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let scheme = url.split("://").next().unwrap_or_default();
        match scheme {
            "memory" => {
                info!("using in-memory cache");
                Ok(Store::Memory(MemoryStore::new()))
            }
            "redis" | "rediss" => {
                info!("connecting to redis cache");
                Ok(Store::Redis(RedisStore::connect(url).await?))
            }
            _ => Err(CacheError::UnsupportedUrl(url.to_owned())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Redis(_) => "redis",
        }
    }

    /// Read and decode a JSON-encoded entry.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        entry: CacheEntry,
    ) -> Result<Option<T>, CacheError> {
        self.get(entry)
            .await?
            .map(|raw| serde_json::from_str(&raw).map_err(|source| CacheError::Decode { entry, source }))
            .transpose()
    }

    /// Encode and write an entry with its default lifetime.
    pub async fn set_json<T: serde::Serialize>(&self, entry: CacheEntry, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value).map_err(|source| CacheError::Encode { entry, source })?;
        self.set_with_expiry(entry, &raw, entry.default_ttl()).await
    }
}

impl KeyValueStore for Store {
    async fn get(&self, entry: CacheEntry) -> Result<Option<String>, CacheError> {
        let value = match self {
            Store::Memory(s) => s.get(entry).await,
            Store::Redis(s) => s.get(entry).await,
        }?;
        let result = if value.is_some() { "hit" } else { "miss" };
        get_metrics()
            .await
            .cache_lookups
            .with_label_values(&[entry.as_label(), result])
            .inc();
        Ok(value)
    }

    async fn set_with_expiry(&self, entry: CacheEntry, value: &str, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Store::Memory(s) => s.set_with_expiry(entry, value, ttl).await,
            Store::Redis(s) => s.set_with_expiry(entry, value, ttl).await,
        }
    }

    async fn delete(&self, entry: CacheEntry) -> Result<(), CacheError> {
        match self {
            Store::Memory(s) => s.delete(entry).await,
            Store::Redis(s) => s.delete(entry).await,
        }
    }
}
