use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    create_attendance, delete_attendance, list_attendance, notify_parent, update_attendance,
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attendance).post(create_attendance))
        .route("/{id}", put(update_attendance).delete(delete_attendance))
        .route("/{id}/notify", post(notify_parent))
}
