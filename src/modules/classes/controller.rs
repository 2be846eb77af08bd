use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scolaris_core::AppError;
use scolaris_models::students::{PaginatedStudentsResponse, StudentFilterParams};

use crate::middleware::auth::{RequireSchoolRead, RequireSchoolWrite};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{
    Class, ClassFilterParams, ClassWithStats, CreateClassDto, PaginatedClassesResponse,
    UpdateClassDto,
};
use super::service::ClassService;

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 409, description = "Class name already exists in this school"),
        (status = 422, description = "Validation error")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let school_id = session.school_id()?;
    let class = ClassService::create_class(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// List classes with their student counts
#[utoipa::path(
    get,
    path = "/api/classes",
    params(ClassFilterParams),
    responses(
        (status = 200, description = "Paginated classes", body = PaginatedClassesResponse),
        (status = 400, description = "Superadmin without school_id"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_classes(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(filters): Query<ClassFilterParams>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let school_id = session.resolve_school(filters.school_id)?;
    let classes = ClassService::list_classes(&state.db, school_id, filters).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class details", body = ClassWithStats),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassWithStats>, AppError> {
    let class = ClassService::get_class(&state.db, session.read_scope(), id).await?;
    Ok(Json(class))
}

#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class name already exists in this school")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_class(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let school_id = session.school_id()?;
    let class = ClassService::update_class(&state.db, school_id, id, dto).await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class still has students")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let school_id = session.school_id()?;
    ClassService::delete_class(&state.db, school_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Students enrolled in a class
#[utoipa::path(
    get,
    path = "/api/classes/{id}/students",
    params(("id" = Uuid, Path, description = "Class ID"), StudentFilterParams),
    responses(
        (status = 200, description = "Students of the class", body = PaginatedStudentsResponse),
        (status = 404, description = "Class not found")
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_class_students(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let class = ClassService::get_class(&state.db, session.read_scope(), id).await?;
    filters.class_id = Some(class.class.id);
    let students = StudentService::list_students(&state.db, class.class.school_id, filters).await?;
    Ok(Json(students))
}
