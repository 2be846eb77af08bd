use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_my_school, update_my_school};

pub fn init_school_router() -> Router<AppState> {
    Router::new().route("/", get(get_my_school).put(update_my_school))
}
