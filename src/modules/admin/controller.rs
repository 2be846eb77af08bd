use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scolaris_core::AppError;

use crate::middleware::auth::RequireSuperAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    AdminUpdateSchoolDto, ExtendSubscriptionDto, PaginatedSchoolsResponse, PlatformStats,
    SchoolDetail, SchoolFilterParams, SchoolView,
};
use super::service::AdminService;

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Platform totals", body = PlatformStats),
        (status = 403, description = "Superadmin only")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
) -> Result<Json<PlatformStats>, AppError> {
    let stats = AdminService::platform_stats(&state.db).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/admin/schools",
    params(SchoolFilterParams),
    responses(
        (status = 200, description = "Schools with their subscription", body = PaginatedSchoolsResponse),
        (status = 403, description = "Superadmin only")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_schools(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Query(filters): Query<SchoolFilterParams>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    let schools = AdminService::list_schools(&state.db, filters).await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/admin/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School with counts and admins", body = SchoolDetail),
        (status = 404, description = "School not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_school(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolDetail>, AppError> {
    let detail = AdminService::get_school_detail(&state.db, id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    put,
    path = "/api/admin/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = AdminUpdateSchoolDto,
    responses(
        (status = 200, description = "Updated school", body = SchoolView),
        (status = 404, description = "School not found"),
        (status = 409, description = "Name or admin email already taken"),
        (status = 422, description = "Validation error")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_school(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AdminUpdateSchoolDto>,
) -> Result<Json<SchoolView>, AppError> {
    let school = AdminService::update_school(&state.db, id, dto).await?;
    Ok(Json(school))
}

#[utoipa::path(
    delete,
    path = "/api/admin/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 204, description = "School and its data deleted"),
        (status = 404, description = "School not found")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_school(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    AdminService::delete_school(&state.db, state.cache.as_ref(), state.storage.as_ref(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/schools/{id}/suspend",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School suspended", body = SchoolView),
        (status = 409, description = "Already suspended")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn suspend_school(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolView>, AppError> {
    Ok(Json(AdminService::suspend(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/schools/{id}/activate",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "Suspension lifted", body = SchoolView),
        (status = 409, description = "Already active")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn activate_school(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolView>, AppError> {
    Ok(Json(AdminService::activate(&state.db, id).await?))
}

/// Freezes the remaining subscription time
#[utoipa::path(
    post,
    path = "/api/admin/schools/{id}/pause",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "Subscription paused", body = SchoolView),
        (status = 409, description = "Already paused, expired, or no end date")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn pause_subscription(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolView>, AppError> {
    Ok(Json(AdminService::pause(&state.db, id).await?))
}

/// Restarts the timer with the frozen remainder
#[utoipa::path(
    post,
    path = "/api/admin/schools/{id}/resume",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "Subscription resumed", body = SchoolView),
        (status = 409, description = "Not paused")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn resume_subscription(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolView>, AppError> {
    Ok(Json(AdminService::resume(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/schools/{id}/extend",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = ExtendSubscriptionDto,
    responses(
        (status = 200, description = "Subscription extended", body = SchoolView),
        (status = 422, description = "Days out of range")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn extend_subscription(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ExtendSubscriptionDto>,
) -> Result<Json<SchoolView>, AppError> {
    Ok(Json(AdminService::extend(&state.db, id, dto.days).await?))
}
