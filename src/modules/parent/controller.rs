use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use uuid::Uuid;

use scolaris_core::{AppError, PaginationParams};
use scolaris_models::attendance::{AttendanceFilterParams, PaginatedAttendanceResponse};
use scolaris_models::documents::PaginatedDocumentsResponse;
use scolaris_models::grades::{GradeFilterParams, PaginatedGradesResponse};
use scolaris_models::students::StudentWithClass;

use crate::middleware::auth::RequireParent;
use crate::modules::attendance::service::AttendanceService;
use crate::modules::documents::service::DocumentService;
use crate::modules::grades::service::GradeService;
use crate::modules::students::service::StudentService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/parent/children",
    responses(
        (status = 200, description = "Students linked to the caller", body = Vec<StudentWithClass>),
        (status = 403, description = "Parents only")
    ),
    tag = "Parent",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_children(
    State(state): State<AppState>,
    RequireParent(session): RequireParent,
) -> Result<Json<Vec<StudentWithClass>>, AppError> {
    let children = StudentService::list_children(&state.db, session.user_id).await?;
    Ok(Json(children))
}

#[utoipa::path(
    get,
    path = "/api/parent/children/{id}/grades",
    params(("id" = Uuid, Path, description = "Student ID"), GradeFilterParams),
    responses(
        (status = 200, description = "The child's grades", body = PaginatedGradesResponse),
        (status = 404, description = "Not one of the caller's children")
    ),
    tag = "Parent",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_child_grades(
    State(state): State<AppState>,
    RequireParent(session): RequireParent,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<GradeFilterParams>,
) -> Result<Json<PaginatedGradesResponse>, AppError> {
    let child = StudentService::get_child(&state.db, session.user_id, id).await?;
    filters.student_id = Some(child.student.id);
    filters.class_id = None;
    let grades = GradeService::list_grades(&state.db, child.student.school_id, filters).await?;
    Ok(Json(grades))
}

#[utoipa::path(
    get,
    path = "/api/parent/children/{id}/attendance",
    params(("id" = Uuid, Path, description = "Student ID"), AttendanceFilterParams),
    responses(
        (status = 200, description = "The child's attendance", body = PaginatedAttendanceResponse),
        (status = 404, description = "Not one of the caller's children")
    ),
    tag = "Parent",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_child_attendance(
    State(state): State<AppState>,
    RequireParent(session): RequireParent,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<AttendanceFilterParams>,
) -> Result<Json<PaginatedAttendanceResponse>, AppError> {
    let child = StudentService::get_child(&state.db, session.user_id, id).await?;
    filters.student_id = Some(child.student.id);
    filters.class_id = None;
    let records =
        AttendanceService::list_attendance(&state.db, child.student.school_id, filters).await?;
    Ok(Json(records))
}

/// The child's documents together with the school-wide ones
#[utoipa::path(
    get,
    path = "/api/parent/children/{id}/documents",
    params(("id" = Uuid, Path, description = "Student ID"), PaginationParams),
    responses(
        (status = 200, description = "Documents visible to the parent", body = PaginatedDocumentsResponse),
        (status = 404, description = "Not one of the caller's children")
    ),
    tag = "Parent",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_child_documents(
    State(state): State<AppState>,
    RequireParent(session): RequireParent,
    Path(id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedDocumentsResponse>, AppError> {
    let child = StudentService::get_child(&state.db, session.user_id, id).await?;
    let documents = DocumentService::list_for_child(
        &state.db,
        child.student.school_id,
        child.student.id,
        pagination,
    )
    .await?;
    Ok(Json(documents))
}
