use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use scolaris_core::AppError;

use crate::middleware::auth::{AuthUser, RequireSuperAdmin};
use crate::state::AppState;

use super::model::{Audience, CreateNotificationForm, Notification};
use super::service::NotificationService;

/// Notifications for the caller's dashboard
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Admins get admin-flagged, parents parent-flagged, superadmin all", body = Vec<Notification>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications =
        NotificationService::list_for(&state.db, Audience::for_role(session.role)).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body(content = CreateNotificationForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Notification published", body = Notification),
        (status = 400, description = "Malformed form or disallowed media type"),
        (status = 403, description = "Superadmin only"),
        (status = 422, description = "Missing title or message")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, multipart))]
pub async fn create_notification(
    State(state): State<AppState>,
    RequireSuperAdmin(session): RequireSuperAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    let (notification, media) = NotificationService::read_form(multipart).await?;
    let created = NotificationService::create_notification(
        &state.db,
        state.storage.as_ref(),
        session.user_id,
        notification,
        media,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Superadmin only"),
        (status = 404, description = "Notification not found")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    NotificationService::delete_notification(&state.db, state.storage.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
