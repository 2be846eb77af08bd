use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use scolaris_core::AppError;

use crate::modules::notifications::service::NotificationService;
use crate::modules::notifications::{Audience, Notification};
use crate::state::AppState;

use super::model::PublicStudentResult;
use super::service::PublicService;

/// Look up a student's results by national student identifier
#[utoipa::path(
    get,
    path = "/api/public/students/{nsi}",
    params(("nsi" = String, Path, description = "National student identifier, e.g. NSI25K7PX3QAM")),
    responses(
        (status = 200, description = "Averages per subject and overall", body = PublicStudentResult),
        (status = 404, description = "No student with this NSI")
    ),
    tag = "Public"
)]
#[instrument(skip(state))]
pub async fn get_student_result(
    State(state): State<AppState>,
    Path(nsi): Path<String>,
) -> Result<Json<PublicStudentResult>, AppError> {
    let result = PublicService::student_result(&state.db, state.cache.as_ref(), &nsi).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/public/notifications",
    responses(
        (status = 200, description = "Notifications shown on the login page", body = Vec<Notification>)
    ),
    tag = "Public"
)]
#[instrument(skip(state))]
pub async fn list_login_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = NotificationService::list_for(&state.db, Audience::LoginPage).await?;
    Ok(Json(notifications))
}
