//! Access token creation and verification.
//!
//! ```ignore
//! use scolaris_auth::{Role, create_access_token, verify_token};
//! use scolaris_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "admin@school.sn", Role::Admin, Some(school_id), &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use scolaris_config::JwtConfig;
use scolaris_core::AppError;

use crate::claims::Claims;
use crate::role::Role;

const ALGORITHM: Algorithm = Algorithm::HS256;

fn validation() -> Validation {
    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

/// Signs an access token carrying the caller's role and school scope,
/// valid for `access_token_expiry` seconds.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: Role,
    school_id: Option<Uuid>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let issued_at = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_owned(),
        role,
        school_id,
        iat: issued_at,
        exp: issued_at + jwt_config.access_token_expiry as usize,
    };

    let key = EncodingKey::from_secret(jwt_config.secret.as_bytes());
    encode(&Header::new(ALGORITHM), &claims, &key)
        .map_err(|e| AppError::internal_error(format!("Failed to sign access token: {e}")))
}

/// Signature and expiry check. Every failure is a 401 with the same message
/// so callers cannot tell a forged token from an expired one.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(jwt_config.secret.as_bytes());
    match decode::<Claims>(token, &key, &validation()) {
        Ok(data) => Ok(data.claims),
        Err(_) => Err(AppError::unauthorized("Invalid or expired token".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry: 900,
        }
    }

    #[test]
    fn test_token_carries_scope() {
        let config = config("scope-secret");
        let user_id = Uuid::new_v4();
        let school_id = Uuid::new_v4();

        let token =
            create_access_token(user_id, "admin@lycee.sn", Role::Admin, Some(school_id), &config)
                .unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.school_id, Some(school_id));
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_garbage_and_foreign_tokens_are_unauthorized() {
        let ours = config("ours");
        let theirs = config("theirs");
        let foreign =
            create_access_token(Uuid::new_v4(), "x@y.sn", Role::SuperAdmin, None, &theirs)
                .unwrap();

        for token in ["not-a-jwt", foreign.as_str()] {
            let err = verify_token(token, &ours).unwrap_err();
            assert_eq!(err.status.as_u16(), 401);
        }
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = config("expiry-secret");
        let past = Utc::now().timestamp() as usize - 120;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "p@ecole.sn".to_string(),
            role: Role::Parent,
            school_id: Some(Uuid::new_v4()),
            iat: past - 900,
            exp: past,
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&token, &config).is_err());
    }
}
