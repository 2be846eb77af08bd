use std::fmt;
use std::sync::Arc;

use scolaris_cache::{CacheConfig, RedisCache};
use scolaris_config::{AnalyticsConfig, CorsConfig, JwtConfig, RateLimitConfig, StorageConfig};
use scolaris_core::file_storage::{FileStorage, LocalFileStorage};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub storage_config: StorageConfig,
    pub analytics_config: AnalyticsConfig,
    pub cache: Option<RedisCache>,
    pub storage: Arc<dyn FileStorage>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("cors_config", &self.cors_config)
            .field("rate_limit_config", &self.rate_limit_config)
            .field("storage_config", &self.storage_config)
            .field("analytics_config", &self.analytics_config)
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

fn local_storage(config: &StorageConfig) -> Arc<dyn FileStorage> {
    Arc::new(LocalFileStorage::new(
        config.upload_dir.clone(),
        config.public_url.clone(),
        config.max_file_bytes,
    ))
}

pub async fn init_app_state(db: PgPool) -> AppState {
    let storage_config = StorageConfig::from_env();
    let cache = CacheConfig::from_env().connect().await;

    AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
        storage: local_storage(&storage_config),
        storage_config,
        analytics_config: AnalyticsConfig::from_env(),
        cache,
    }
}

/// State for router tests: no cache, no rate limiting, uploads in `upload_dir`.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_state(db: PgPool, upload_dir: std::path::PathBuf) -> AppState {
    test_state_with_storage(db, StorageConfig::new(upload_dir, "/uploads", 1024 * 1024))
}

#[cfg(any(test, feature = "test-utils"))]
pub fn test_state_with_storage(db: PgPool, storage_config: StorageConfig) -> AppState {
    AppState {
        db,
        jwt_config: JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
        },
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        rate_limit_config: RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        },
        storage: local_storage(&storage_config),
        storage_config,
        analytics_config: AnalyticsConfig::default(),
        cache: None,
    }
}
