use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use scolaris_auth::{Capability, Session, authorize, verify_token};
use scolaris_config::JwtConfig;
use scolaris_core::AppError;

use crate::metrics;
use crate::state::AppState;

/// Reads and verifies the bearer token into a [`Session`].
pub fn session_from_headers(headers: &HeaderMap, jwt_config: &JwtConfig) -> Result<Session, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = verify_token(token, jwt_config);
    metrics::track_jwt_validation(claims.is_ok());

    Session::try_from(claims?)
}

/// Any authenticated caller.
///
/// Reuses the session when the tenant write guard already decoded it for
/// this request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Session);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(AuthUser(session.clone()));
        }

        let session = session_from_headers(&parts.headers, &state.jwt_config)?;
        Ok(AuthUser(session))
    }
}

/// Declares an extractor that authenticates the caller and evaluates one
/// policy capability before the handler runs.
#[macro_export]
macro_rules! require_capability {
    ($name:ident, $capability:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub scolaris_auth::Session);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = scolaris_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let $crate::middleware::auth::AuthUser(session) =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                $crate::middleware::auth::check(&session, $capability)?;

                Ok($name(session))
            }
        }
    };
}

#[doc(hidden)]
pub fn check(session: &Session, capability: Capability) -> Result<(), AppError> {
    let decision = authorize(session, capability);
    metrics::track_authorization_check(decision.is_allowed(), session.role.as_str());
    decision.into_result()
}

// Admins of a school, and the superadmin on reads.
require_capability!(RequireSchoolRead, scolaris_auth::Capability::ReadSchoolData);
// Admins of a school only; subscription standing is enforced by the tenant guard.
require_capability!(RequireSchoolWrite, scolaris_auth::Capability::WriteSchoolData);
require_capability!(RequireParent, scolaris_auth::Capability::ReadOwnChildren);
require_capability!(RequireSuperAdmin, scolaris_auth::Capability::ManagePlatform);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use scolaris_auth::{Role, create_access_token};
    use uuid::Uuid;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "middleware-test-secret".to_string(),
            access_token_expiry: 3600,
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_token_builds_session() {
        let config = jwt_config();
        let user_id = Uuid::new_v4();
        let school_id = Uuid::new_v4();
        let token =
            create_access_token(user_id, "a@b.test", Role::Admin, Some(school_id), &config)
                .unwrap();

        let session = session_from_headers(&headers_with(&format!("Bearer {token}")), &config)
            .unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.school_id, Some(school_id));
        assert_eq!(session.role, Role::Admin);
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let err = session_from_headers(&HeaderMap::new(), &jwt_config()).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_non_bearer_scheme_is_unauthorized() {
        let err = session_from_headers(&headers_with("Basic abc"), &jwt_config()).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_foreign_signature_is_unauthorized() {
        let other = JwtConfig {
            secret: "other-secret".to_string(),
            access_token_expiry: 3600,
        };
        let token =
            create_access_token(Uuid::new_v4(), "a@b.test", Role::SuperAdmin, None, &other)
                .unwrap();

        let err = session_from_headers(&headers_with(&format!("Bearer {token}")), &jwt_config())
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_check_maps_denial_to_forbidden() {
        let session = Session {
            user_id: Uuid::new_v4(),
            email: "p@b.test".to_string(),
            role: Role::Parent,
            school_id: Some(Uuid::new_v4()),
        };
        let err = check(&session, Capability::WriteSchoolData).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.code, Some("role_not_permitted"));
        assert!(check(&session, Capability::ReadOwnChildren).is_ok());
    }
}
