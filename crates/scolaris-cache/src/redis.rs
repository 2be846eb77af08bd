//! Redis client with JSON values and namespaced keys.

use std::time::Duration;

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Cloneable handle; clones share one multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    prefix: String,
    default_ttl: Duration,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    pub async fn new(redis_url: &str, prefix: &str, default_ttl: Duration) -> Result<Self, CacheError> {
        let conn = ConnectionManager::new(Client::open(redis_url)?).await?;
        Ok(Self {
            conn,
            prefix: prefix.to_owned(),
            default_ttl,
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }

    /// `None` on a miss, on a Redis failure and on an entry that no longer
    /// decodes as `T`. Callers always have the database to fall back on.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let key = self.full_key(key);

        let raw = match self.conn.clone().get::<_, Option<String>>(&key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Cache read failed");
                return None;
            }
        };
        let Some(raw) = raw else {
            debug!(cache.key = %key, "Cache miss");
            return None;
        };

        serde_json::from_str(&raw)
            .inspect(|_| debug!(cache.key = %key, "Cache hit"))
            .inspect_err(|e| warn!(cache.key = %key, error = %e, "Undecodable cache entry"))
            .ok()
    }

    /// Stores with the configured default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX", cache.ttl_secs = ttl.as_secs()))]
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        self.conn
            .clone()
            .set_ex::<_, _, ()>(self.full_key(key), payload, ttl.as_secs())
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.conn.clone().del::<_, ()>(self.full_key(key)).await?;
        debug!(cache.key = key, "Cache entry removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Banner {
        title: String,
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_set_get_invalidate() {
        let cache = RedisCache::new("redis://localhost:6379", "scolaris-test", Duration::from_secs(60))
            .await
            .unwrap();

        let banner = Banner {
            title: "Rentrée".to_string(),
        };
        cache.set("banner", &banner).await.unwrap();
        assert_eq!(cache.get::<Banner>("banner").await, Some(banner));

        cache.invalidate("banner").await.unwrap();
        assert_eq!(cache.get::<Banner>("banner").await, None);
    }
}
