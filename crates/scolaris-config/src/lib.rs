//! # Scolaris Config
//!
//! Configuration structures loaded from environment variables. Every value
//! has a default so a bare `.env` with `DATABASE_URL` is enough for development.
//!
//! - [`analytics`]: risk sentinel thresholds
//! - [`cors`]: allowed browser origins
//! - [`jwt`]: token signing secret and lifetime
//! - [`rate_limit`]: auth endpoint throttling
//! - [`server`]: bind address
//! - [`storage`]: upload directory and public URL prefix
//!
//! ```ignore
//! use scolaris_config::{JwtConfig, StorageConfig};
//!
//! let jwt = JwtConfig::from_env();
//! let storage = StorageConfig::from_env();
//! ```

pub mod analytics;
pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;
pub mod storage;

pub use analytics::AnalyticsConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::{AuthGovernorConfig, ClientIpKeyExtractor, RateLimitConfig};
pub use server::ServerConfig;
pub use storage::StorageConfig;
