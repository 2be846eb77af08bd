use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{create_subject, delete_subject, get_subject, list_subjects, update_subject};

pub fn init_subjects_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects).post(create_subject))
        .route(
            "/{id}",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
}
