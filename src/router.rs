use std::sync::Arc;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::tenant::enforce_school_writable;
use crate::modules::admin::router::init_admin_router;
use crate::modules::analytics::router::init_analytics_router;
use crate::modules::attendance::router::init_attendance_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::classes::router::init_classes_router;
use crate::modules::documents::router::init_documents_router;
use crate::modules::grades::router::init_grades_router;
use crate::modules::notifications::router::init_notifications_router;
use crate::modules::parent::router::init_parent_router;
use crate::modules::parents::router::init_parents_router;
use crate::modules::public::router::init_public_router;
use crate::modules::school::router::init_school_router;
use crate::modules::students::router::init_students_router;
use crate::modules::subjects::router::init_subjects_router;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

/// Routers holding one school's data. Writes through them pass the
/// subscription gate first.
fn tenant_router(state: &AppState) -> Router<AppState> {
    let body_limit = DefaultBodyLimit::max(state.storage_config.body_limit());

    Router::new()
        .nest("/school", init_school_router())
        .nest("/classes", init_classes_router())
        .nest("/subjects", init_subjects_router())
        .nest("/parents", init_parents_router())
        .nest("/students", init_students_router())
        .nest("/grades", init_grades_router())
        .nest("/attendance", init_attendance_router())
        .nest("/documents", init_documents_router().layer(body_limit))
        .nest("/analytics", init_analytics_router())
        .nest("/parent", init_parent_router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_school_writable,
        ))
}

fn auth_router(state: &AppState) -> Router<AppState> {
    let router = init_auth_router();
    match state.rate_limit_config.auth_governor_config() {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => router,
    }
}

pub fn init_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.storage_config.upload_dir);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest_service(&state.storage_config.mount_path(), uploads)
        .nest(
            "/api",
            Router::new()
                .nest("/auth", auth_router(&state))
                .nest("/public", init_public_router())
                .nest(
                    "/notifications",
                    init_notifications_router()
                        .layer(DefaultBodyLimit::max(state.storage_config.body_limit())),
                )
                .nest("/admin", init_admin_router())
                .merge(tenant_router(&state)),
        )
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                    axum::http::header::IF_NONE_MATCH,
                ])
                .expose_headers([axum::http::header::ETAG])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
