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
    Attendance, AttendanceFilterParams, CreateAttendanceDto, PaginatedAttendanceResponse,
    UpdateAttendanceDto,
};
use super::service::AttendanceService;

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendanceDto,
    responses(
        (status = 201, description = "Attendance recorded", body = Attendance),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Already recorded for this date")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_attendance(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    ValidatedJson(dto): ValidatedJson<CreateAttendanceDto>,
) -> Result<(StatusCode, Json<Attendance>), AppError> {
    let school_id = session.school_id()?;
    let record = AttendanceService::create_attendance(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilterParams),
    responses(
        (status = 200, description = "Paginated attendance", body = PaginatedAttendanceResponse),
        (status = 400, description = "Superadmin without school_id")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_attendance(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(filters): Query<AttendanceFilterParams>,
) -> Result<Json<PaginatedAttendanceResponse>, AppError> {
    let school_id = session.resolve_school(filters.school_id)?;
    let records = AttendanceService::list_attendance(&state.db, school_id, filters).await?;
    Ok(Json(records))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    request_body = UpdateAttendanceDto,
    responses(
        (status = 200, description = "Attendance updated", body = Attendance),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_attendance(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAttendanceDto>,
) -> Result<Json<Attendance>, AppError> {
    let school_id = session.school_id()?;
    let record = AttendanceService::update_attendance(&state.db, school_id, id, dto).await?;
    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    responses(
        (status = 204, description = "Attendance deleted"),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_attendance(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let school_id = session.school_id()?;
    AttendanceService::delete_attendance(&state.db, school_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark an attendance record as communicated to the parent
#[utoipa::path(
    post,
    path = "/api/attendance/{id}/notify",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Parent marked as notified", body = Attendance),
        (status = 404, description = "Attendance record not found"),
        (status = 409, description = "Student has no linked parent")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn notify_parent(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
) -> Result<Json<Attendance>, AppError> {
    let school_id = session.school_id()?;
    let record = AttendanceService::notify_parent(&state.db, school_id, id).await?;
    Ok(Json(record))
}
