use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use scolaris_core::AppError;

use crate::middleware::auth::RequireSchoolRead;
use crate::state::AppState;

use super::model::{PerformanceQueryParams, PerformanceResponse, RiskQueryParams, RiskResponse};
use super::service::AnalyticsService;

/// Students flagged for a low average or too many absences
#[utoipa::path(
    get,
    path = "/api/analytics/risk",
    params(RiskQueryParams),
    responses(
        (status = 200, description = "Flagged students, most absent first", body = RiskResponse),
        (status = 400, description = "Superadmin without school_id"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Analytics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_risk(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(params): Query<RiskQueryParams>,
) -> Result<Json<RiskResponse>, AppError> {
    let school_id = session.resolve_school(params.school_id)?;
    let response =
        AnalyticsService::at_risk_students(&state.db, &state.analytics_config, school_id, params)
            .await?;
    Ok(Json(response))
}

/// Leaderboard of grade averages by class or subject
#[utoipa::path(
    get,
    path = "/api/analytics/performance",
    params(PerformanceQueryParams),
    responses(
        (status = 200, description = "Groups ordered by average", body = PerformanceResponse),
        (status = 400, description = "Superadmin without school_id, or unknown group_by")
    ),
    tag = "Analytics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_performance(
    State(state): State<AppState>,
    RequireSchoolRead(session): RequireSchoolRead,
    Query(params): Query<PerformanceQueryParams>,
) -> Result<Json<PerformanceResponse>, AppError> {
    let school_id = session.resolve_school(params.school_id)?;
    let response = AnalyticsService::performance(&state.db, school_id, params).await?;
    Ok(Json(response))
}
