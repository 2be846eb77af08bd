use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_child_attendance, get_child_documents, get_child_grades, list_children};

pub fn init_parent_router() -> Router<AppState> {
    Router::new()
        .route("/children", get(list_children))
        .route("/children/{id}/grades", get(get_child_grades))
        .route("/children/{id}/attendance", get(get_child_attendance))
        .route("/children/{id}/documents", get(get_child_documents))
}
