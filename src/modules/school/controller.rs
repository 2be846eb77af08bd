use axum::{Json, extract::State};
use tracing::instrument;

use scolaris_core::AppError;

use crate::middleware::auth::{RequireSchoolRead, RequireSchoolWrite};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{SchoolView, UpdateSchoolDto};
use super::service::SchoolService;

/// The caller's school with its subscription summary
#[utoipa::path(
    get,
    path = "/api/school",
    responses(
        (status = 200, description = "Own school", body = SchoolView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller has no school scope")
    ),
    tag = "School",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_school(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
) -> Result<Json<SchoolView>, AppError> {
    let school_id = session.school_id()?;
    let school = SchoolService::get_school_view(&state.db, school_id).await?;
    Ok(Json(school))
}

#[utoipa::path(
    put,
    path = "/api/school",
    request_body = UpdateSchoolDto,
    responses(
        (status = 200, description = "School updated", body = SchoolView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a school admin, or school suspended/expired"),
        (status = 409, description = "School name already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "School",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_my_school(
    State(state): State<AppState>,
    RequireSchoolWrite(session): RequireSchoolWrite,
    ValidatedJson(dto): ValidatedJson<UpdateSchoolDto>,
) -> Result<Json<SchoolView>, AppError> {
    let school_id = session.school_id()?;
    let school = SchoolService::update_school(&state.db, school_id, dto).await?;
    Ok(Json(school))
}
