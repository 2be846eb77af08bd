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
    CreateParentDto, PaginatedParentsResponse, ParentFilterParams, ParentWithChildren,
    UpdateParentDto, User,
};
use super::service::ParentService;

/// Create a parent account in the caller's school
#[utoipa::path(
    post,
    path = "/api/parents",
    request_body = CreateParentDto,
    responses(
        (status = 201, description = "Parent created", body = User),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_parent(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    ValidatedJson(dto): ValidatedJson<CreateParentDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let school_id = session.school_id()?;
    let parent = ParentService::create_parent(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(parent)))
}

#[utoipa::path(
    get,
    path = "/api/parents",
    params(ParentFilterParams),
    responses(
        (status = 200, description = "Paginated parents with children counts", body = PaginatedParentsResponse),
        (status = 400, description = "Superadmin without school_id")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_parents(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(filters): Query<ParentFilterParams>,
) -> Result<Json<PaginatedParentsResponse>, AppError> {
    let school_id = session.resolve_school(filters.school_id)?;
    let parents = ParentService::list_parents(&state.db, school_id, filters).await?;
    Ok(Json(parents))
}

#[utoipa::path(
    get,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent user ID")),
    responses(
        (status = 200, description = "Parent", body = ParentWithChildren),
        (status = 404, description = "Parent not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_parent(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
) -> Result<Json<ParentWithChildren>, AppError> {
    let parent = ParentService::get_parent(&state.db, session.read_scope(), id).await?;
    Ok(Json(parent))
}

#[utoipa::path(
    put,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent user ID")),
    request_body = UpdateParentDto,
    responses(
        (status = 200, description = "Parent updated", body = User),
        (status = 404, description = "Parent not found"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_parent(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateParentDto>,
) -> Result<Json<User>, AppError> {
    let school_id = session.school_id()?;
    let parent = ParentService::update_parent(&state.db, school_id, id, dto).await?;
    Ok(Json(parent))
}

#[utoipa::path(
    delete,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent user ID")),
    responses(
        (status = 204, description = "Parent deleted, children unlinked"),
        (status = 404, description = "Parent not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_parent(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let school_id = session.school_id()?;
    ParentService::delete_parent(&state.db, school_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
