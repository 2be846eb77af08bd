use axum::{Json, extract::State};
use tracing::instrument;

use scolaris_core::AppError;

use crate::middleware::auth::RequireSuperAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{PlatformSettings, UpdateSettingsDto};
use super::service::SettingsService;

/// Public platform settings, missing keys filled with defaults
#[utoipa::path(
    get,
    path = "/api/public/settings",
    responses(
        (status = 200, description = "Platform settings", body = PlatformSettings)
    ),
    tag = "Public"
)]
#[instrument(skip(state))]
pub async fn get_public_settings(
    State(state): State<AppState>,
) -> Result<Json<PlatformSettings>, AppError> {
    let settings = SettingsService::load_cached(&state.db, state.cache.as_ref()).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = UpdateSettingsDto,
    responses(
        (status = 200, description = "Updated settings", body = PlatformSettings),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Superadmin only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_settings(
    State(state): State<AppState>,
    RequireSuperAdmin(_session): RequireSuperAdmin,
    ValidatedJson(dto): ValidatedJson<UpdateSettingsDto>,
) -> Result<Json<PlatformSettings>, AppError> {
    let settings = SettingsService::update(&state.db, state.cache.as_ref(), dto).await?;
    Ok(Json(settings))
}
