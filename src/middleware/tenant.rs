//! Subscription write gate for tenant routers.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use scolaris_auth::{Decision, DenyReason, authorize_write};
use scolaris_core::AppError;

use crate::middleware::auth::session_from_headers;
use crate::modules::school::service::SchoolService;
use crate::state::AppState;

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Rejects mutating requests from school users whose school is suspended or
/// expired, before the handler touches anything.
///
/// Requests without a usable token, and superadmin requests, pass through
/// untouched; the route's extractor produces the 401/403 for them. The
/// decoded session is stored in the request extensions for [`AuthUser`].
///
/// [`AuthUser`]: crate::middleware::auth::AuthUser
pub async fn enforce_school_writable(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_read_only(req.method()) {
        return Ok(next.run(req).await);
    }

    let Ok(session) = session_from_headers(req.headers(), &state.jwt_config) else {
        return Ok(next.run(req).await);
    };

    if let Some(school_id) = session.read_scope() {
        let school = SchoolService::get_school(&state.db, school_id).await?;
        let standing = school.subscription().standing(Utc::now());

        if let Decision::Deny(
            reason @ (DenyReason::SchoolSuspended | DenyReason::SubscriptionExpired),
        ) = authorize_write(&session, standing)
        {
            warn!(
                school.id = %school_id,
                user.id = %session.user_id,
                code = reason.code(),
                "Write rejected by subscription gate"
            );
            return Err(reason.into_error());
        }
        debug!(school.id = %school_id, "School is writable");
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_methods() {
        assert!(is_read_only(&Method::GET));
        assert!(is_read_only(&Method::HEAD));
        assert!(is_read_only(&Method::OPTIONS));
        assert!(!is_read_only(&Method::POST));
        assert!(!is_read_only(&Method::PUT));
        assert!(!is_read_only(&Method::DELETE));
    }
}
