use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{delete_document, list_documents, upload_document};

/// Document routes. The caller sets the request body limit for uploads.
pub fn init_documents_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents).post(upload_document))
        .route("/{id}", delete(delete_document))
}
