use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use scolaris_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{ErrorResponse, LoginRequest, LoginResponse, MeResponse, RegisterSchoolRequest};
use super::service::AuthService;

/// Register a school and its first admin, starting the free trial
#[utoipa::path(
    post,
    path = "/api/auth/register-school",
    request_body = RegisterSchoolRequest,
    responses(
        (status = 201, description = "School registered, admin logged in", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 409, description = "School name or email already taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn register_school(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterSchoolRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let response = AuthService::register_school(&state.db, dto, &state.jwt_config).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests")
    ),
    tag = "Authentication"
)]
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login(&state.db, dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// The caller's account and, for school users, their school
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let me = AuthService::me(&state.db, &session).await?;
    Ok(Json(me))
}
