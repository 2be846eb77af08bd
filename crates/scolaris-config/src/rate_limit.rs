//! Rate limiting configuration for the authentication endpoints.
//!
//! Login and school registration are the only unauthenticated write paths,
//! so they are the ones guarded by a per-client token bucket.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_AUTH_PERIOD_SECONDS`: seconds to replenish one token (default: 2)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: bucket size (default: 10)

use std::net::{IpAddr, Ipv4Addr};

use axum::http::Request;
use governor::middleware::NoOpMiddleware;
use tower_governor::GovernorError;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::{KeyExtractor, SmartIpKeyExtractor};
use tracing::warn;

/// Client IP from `X-Forwarded-For`/`X-Real-IP`/`Forwarded`, then the peer
/// address. Requests with none of these share the unspecified-address bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        Ok(SmartIpKeyExtractor
            .extract(req)
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

pub type AuthGovernorConfig = GovernorConfig<ClientIpKeyExtractor, NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth_period_seconds: u64,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_period_seconds: 2,
            auth_burst_size: 10,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            auth_period_seconds: std::env::var("RATE_LIMIT_AUTH_PERIOD_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.auth_period_seconds),
            auth_burst_size: std::env::var("RATE_LIMIT_AUTH_BURST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.auth_burst_size),
        }
    }

    /// Governor config for `/api/auth`. `None` when disabled or when the
    /// configured values are rejected by the builder (zero period or burst).
    #[must_use]
    pub fn auth_governor_config(&self) -> Option<AuthGovernorConfig> {
        if !self.enabled {
            return None;
        }

        let config = GovernorConfigBuilder::default()
            .per_second(self.auth_period_seconds)
            .burst_size(self.auth_burst_size)
            .key_extractor(ClientIpKeyExtractor)
            .finish();

        if config.is_none() {
            warn!(
                period_seconds = self.auth_period_seconds,
                burst_size = self.auth_burst_size,
                "Invalid auth rate limit settings; rate limiting disabled"
            );
        }

        config
    }
}
