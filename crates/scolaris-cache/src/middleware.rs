//! HTTP caching headers for public, unauthenticated reads.
//!
//! ```ignore
//! Router::new()
//!     .route("/settings", get(get_public_settings))
//!     .layer(cache_control(CacheControlConfig::public(60)))
//!     .layer(axum::middleware::from_fn(etag_middleware));
//! ```

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderValue, Method, StatusCode,
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use sha2::{Digest, Sha256};
use tower_http::set_header::SetResponseHeaderLayer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheControlConfig {
    Public { max_age: u64 },
    NoStore,
}

impl CacheControlConfig {
    pub fn public(max_age: u64) -> Self {
        Self::Public { max_age }
    }

    pub fn to_header_value(&self) -> HeaderValue {
        match self {
            Self::Public { max_age } => HeaderValue::from_str(&format!("public, max-age={}", max_age))
                .unwrap_or_else(|_| HeaderValue::from_static("no-cache")),
            Self::NoStore => HeaderValue::from_static("no-store"),
        }
    }
}

/// Sets `Cache-Control` unless the handler already did.
pub fn cache_control(config: CacheControlConfig) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, config.to_header_value())
}

fn generate_etag(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("\"{}\"", hex::encode(&hash[..16]))
}

fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}

/// Hashes successful GET bodies into an `ETag` and answers a matching
/// `If-None-Match` with 304. Buffers the body, so keep it on small responses.
pub async fn etag_middleware(request: Request, next: Next) -> Response {
    let is_get = request.method() == Method::GET;
    let if_none_match = request
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;
    if !is_get || !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let etag = generate_etag(&bytes);
    let Ok(etag_value) = HeaderValue::from_str(&etag) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    if if_none_match.is_some_and(|inm| etag_matches(&inm, &etag)) {
        let mut not_modified = StatusCode::NOT_MODIFIED.into_response();
        not_modified.headers_mut().insert(ETAG, etag_value);
        if let Some(cc) = parts.headers.get(CACHE_CONTROL) {
            not_modified.headers_mut().insert(CACHE_CONTROL, cc.clone());
        }
        return not_modified;
    }

    parts.headers.insert(ETAG, etag_value);
    Response::from_parts(parts, Body::from(bytes))
}
