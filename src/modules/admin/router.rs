use axum::{
    Router,
    routing::{get, post, put},
};

use crate::modules::settings::controller::update_settings;
use crate::state::AppState;

use super::controller::{
    activate_school, delete_school, extend_subscription, get_school, get_stats, list_schools,
    pause_subscription, resume_subscription, suspend_school, update_school,
};

pub fn init_admin_router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/schools", get(list_schools))
        .route(
            "/schools/{id}",
            get(get_school).put(update_school).delete(delete_school),
        )
        .route("/schools/{id}/suspend", post(suspend_school))
        .route("/schools/{id}/activate", post(activate_school))
        .route("/schools/{id}/pause", post(pause_subscription))
        .route("/schools/{id}/resume", post(resume_subscription))
        .route("/schools/{id}/extend", post(extend_subscription))
        .route("/settings", put(update_settings))
}
