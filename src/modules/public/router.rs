use axum::{Router, middleware, routing::get};

use scolaris_cache::middleware::{CacheControlConfig, cache_control, etag_middleware};

use crate::modules::settings::controller::get_public_settings;
use crate::state::AppState;

use super::controller::{get_student_result, list_login_notifications};

const SETTINGS_MAX_AGE_SECS: u64 = 300;

pub fn init_public_router() -> Router<AppState> {
    let settings = Router::new()
        .route("/settings", get(get_public_settings))
        .layer(middleware::from_fn(etag_middleware))
        .layer(cache_control(CacheControlConfig::public(SETTINGS_MAX_AGE_SECS)));

    Router::new()
        .merge(settings)
        .route("/students/{nsi}", get(get_student_result))
        .route("/notifications", get(list_login_notifications))
}
