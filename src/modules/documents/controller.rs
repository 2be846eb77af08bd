use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scolaris_core::AppError;

use crate::middleware::auth::{RequireSchoolRead, RequireSchoolWrite};
use crate::state::AppState;

use super::model::{Document, DocumentFilterParams, PaginatedDocumentsResponse, UploadDocumentForm};
use super::service::DocumentService;

/// Upload a document, school-wide or attached to one student
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body(content = UploadDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = Document),
        (status = 400, description = "Missing field, empty file, oversized file or disallowed type"),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 404, description = "Student not found"),
        (status = 413, description = "Request body too large")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn upload_document(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let school_id = session.school_id()?;
    let upload = DocumentService::read_upload(multipart).await?;
    let document = DocumentService::upload_document(
        &state.db,
        state.storage.as_ref(),
        school_id,
        session.user_id,
        upload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/api/documents",
    params(DocumentFilterParams),
    responses(
        (status = 200, description = "Paginated documents", body = PaginatedDocumentsResponse),
        (status = 400, description = "Superadmin without school_id")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_documents(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(filters): Query<DocumentFilterParams>,
) -> Result<Json<PaginatedDocumentsResponse>, AppError> {
    let school_id = session.resolve_school(filters.school_id)?;
    let documents = DocumentService::list_documents(&state.db, school_id, filters).await?;
    Ok(Json(documents))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let school_id = session.school_id()?;
    DocumentService::delete_document(&state.db, state.storage.as_ref(), school_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
