use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_me, login, register_school};

/// Routes under `/api/auth`. The caller layers rate limiting on the whole
/// router, `/me` included.
pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register-school", post(register_school))
        .route("/login", post(login))
        .route("/me", get(get_me))
}
