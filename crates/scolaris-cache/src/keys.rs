//! Cache key names and invalidation helpers.
//!
//! Keys here are relative; [`RedisCache`] adds the configured prefix.

use std::time::Duration;

use tracing::warn;

use crate::RedisCache;

/// Public results are not invalidated on grade writes; they age out.
pub const PUBLIC_RESULT_TTL: Duration = Duration::from_secs(60);

fn build_key(parts: &[&str]) -> String {
    parts.join(":")
}

/// The public platform settings document.
pub fn platform_settings() -> String {
    build_key(&["settings", "public"])
}

/// Public result lookup for one NSI.
pub fn public_result(nsi: &str) -> String {
    build_key(&["public", "student", nsi])
}

/// Best-effort invalidation. A cache failure is logged, never surfaced:
/// the database write it follows has already committed.
pub mod invalidate {
    use super::*;

    pub async fn settings(cache: Option<&RedisCache>) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.invalidate(&platform_settings()).await {
            warn!(error = %e, "Failed to invalidate settings cache");
        }
    }

    pub async fn public_result(cache: Option<&RedisCache>, nsi: &str) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.invalidate(&super::public_result(nsi)).await {
            warn!(error = %e, nsi = %nsi, "Failed to invalidate public result cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(platform_settings(), "settings:public");
        assert_eq!(public_result("NSI25ABCDEFGH"), "public:student:NSI25ABCDEFGH");
    }

    #[tokio::test]
    async fn test_invalidate_without_cache_is_noop() {
        invalidate::settings(None).await;
        invalidate::public_result(None, "NSI25ABCDEFGH").await;
    }
}
