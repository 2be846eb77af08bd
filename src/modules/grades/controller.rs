use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scolaris_core::AppError;

use crate::middleware::auth::{RequireSchoolRead, RequireSchoolWrite};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    BulkGradeDto, BulkGradeResponse, CreateGradeDto, Grade, GradeFilterParams, GradeWithDetails,
    PaginatedGradesResponse, UpdateGradeDto,
};
use super::service::GradeService;

#[utoipa::path(
    post,
    path = "/api/grades",
    request_body = CreateGradeDto,
    responses(
        (status = 201, description = "Grade recorded", body = Grade),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 404, description = "Student or subject not found in this school"),
        (status = 422, description = "Validation error")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_grade(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    ValidatedJson(dto): ValidatedJson<CreateGradeDto>,
) -> Result<(StatusCode, Json<Grade>), AppError> {
    let school_id = session.school_id()?;
    let grade = GradeService::create_grade(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

/// Record the same evaluation for many students at once
#[utoipa::path(
    post,
    path = "/api/grades/bulk",
    request_body = BulkGradeDto,
    responses(
        (status = 201, description = "All grades recorded", body = BulkGradeResponse),
        (status = 404, description = "Subject or a student not found; nothing recorded"),
        (status = 422, description = "Validation error")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn bulk_create_grades(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    ValidatedJson(dto): ValidatedJson<BulkGradeDto>,
) -> Result<(StatusCode, Json<BulkGradeResponse>), AppError> {
    let school_id = session.school_id()?;
    let response = GradeService::bulk_create_grades(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/grades",
    params(GradeFilterParams),
    responses(
        (status = 200, description = "Paginated grades", body = PaginatedGradesResponse),
        (status = 400, description = "Superadmin without school_id")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_grades(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(filters): Query<GradeFilterParams>,
) -> Result<Json<PaginatedGradesResponse>, AppError> {
    let school_id = session.resolve_school(filters.school_id)?;
    let grades = GradeService::list_grades(&state.db, school_id, filters).await?;
    Ok(Json(grades))
}

#[utoipa::path(
    get,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade", body = GradeWithDetails),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_grade(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
) -> Result<Json<GradeWithDetails>, AppError> {
    let grade = GradeService::get_grade(&state.db, session.read_scope(), id).await?;
    Ok(Json(grade))
}

#[utoipa::path(
    put,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade ID")),
    request_body = UpdateGradeDto,
    responses(
        (status = 200, description = "Grade updated", body = Grade),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_grade(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateGradeDto>,
) -> Result<Json<Grade>, AppError> {
    let school_id = session.school_id()?;
    let grade = GradeService::update_grade(&state.db, school_id, id, dto).await?;
    Ok(Json(grade))
}

#[utoipa::path(
    delete,
    path = "/api/grades/{id}",
    params(("id" = Uuid, Path, description = "Grade ID")),
    responses(
        (status = 204, description = "Grade deleted"),
        (status = 404, description = "Grade not found")
    ),
    tag = "Grades",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_grade(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let school_id = session.school_id()?;
    GradeService::delete_grade(&state.db, school_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
