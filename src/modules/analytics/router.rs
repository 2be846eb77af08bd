use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_performance, get_risk};

pub fn init_analytics_router() -> Router<AppState> {
    Router::new()
        .route("/risk", get(get_risk))
        .route("/performance", get(get_performance))
}
