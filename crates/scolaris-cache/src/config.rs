use std::env;
use std::time::Duration;

use tracing::{info, warn};

use crate::redis::RedisCache;

/// Cache settings from the environment.
///
/// - `REDIS_URL`: enables the cache when set
/// - `CACHE_TTL_SECONDS`: default entry lifetime (default `300`)
/// - `CACHE_PREFIX`: namespace for every key (default `scolaris`)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub redis_url: Option<String>,
    pub default_ttl_seconds: u64,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl_seconds: 300,
            key_prefix: "scolaris".into(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            default_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_seconds),
            key_prefix: env::var("CACHE_PREFIX")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.key_prefix),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Connects when a URL is configured. A failed connection is logged and
    /// the API runs uncached.
    pub async fn connect(&self) -> Option<RedisCache> {
        let url = self.redis_url.as_deref()?;

        match RedisCache::new(url, &self.key_prefix, self.default_ttl()).await {
            Ok(cache) => {
                info!(cache.prefix = %self.key_prefix, "Redis cache connected");
                Some(cache)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, continuing without cache");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disable_cache() {
        let config = CacheConfig::default();
        assert!(config.redis_url.is_none());
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.key_prefix, "scolaris");
    }

    #[tokio::test]
    async fn test_connect_without_url_is_none() {
        assert!(CacheConfig::default().connect().await.is_none());
    }
}
