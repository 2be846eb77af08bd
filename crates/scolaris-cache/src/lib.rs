//! # Scolaris Cache
//!
//! Optional Redis read-through cache for hot public reads (platform
//! settings) and the HTTP caching headers served alongside them.
//!
//! The cache is strictly optional: with no `REDIS_URL` the API reads the
//! database every time.
//!
//! ```ignore
//! use scolaris_cache::{CacheConfig, keys};
//!
//! let cache = CacheConfig::from_env().connect().await;
//! if let Some(cache) = &cache {
//!     let hit: Option<PlatformSettings> = cache.get(&keys::platform_settings()).await;
//! }
//! ```

pub mod config;
pub mod keys;
pub mod middleware;
pub mod redis;

pub use config::CacheConfig;
pub use keys::invalidate;
pub use middleware::{CacheControlConfig, cache_control, etag_middleware};
pub use redis::{CacheError, RedisCache};
