//! The authenticated caller, passed explicitly into services.

use uuid::Uuid;

use scolaris_core::AppError;

use crate::claims::Claims;
use crate::policy::DenyReason;
use crate::role::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub school_id: Option<Uuid>,
}

impl Session {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// The caller's own school. Fails for callers without a school scope.
    pub fn school_id(&self) -> Result<Uuid, AppError> {
        self.school_id
            .ok_or_else(|| DenyReason::MissingSchoolScope.into_error())
    }

    /// School filter for reads: `None` lets the superadmin see every tenant.
    pub fn read_scope(&self) -> Option<Uuid> {
        if self.is_super_admin() {
            None
        } else {
            self.school_id
        }
    }

    /// Picks the school an operation targets.
    ///
    /// School users always get their own school and `requested` is ignored.
    /// The superadmin has no implicit school and must name one.
    pub fn resolve_school(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        if self.is_super_admin() {
            return requested.ok_or_else(|| {
                AppError::bad_request(anyhow::anyhow!(
                    "Superadmin must specify school_id for this operation"
                ))
            });
        }
        self.school_id()
    }
}

impl TryFrom<Claims> for Session {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))?;

        if claims.role.is_school_scoped() && claims.school_id.is_none() {
            return Err(AppError::unauthorized(
                "Token is missing a school scope".to_string(),
            ));
        }

        Ok(Session {
            user_id,
            email: claims.email,
            role: claims.role,
            school_id: claims.school_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role, school_id: Option<Uuid>) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            email: "user@example.com".to_string(),
            role,
            school_id,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_session_from_admin_claims() {
        let school_id = Uuid::new_v4();
        let c = claims(Role::Admin, Some(school_id));
        let sub = c.sub.clone();
        let session = Session::try_from(c).unwrap();

        assert_eq!(session.user_id.to_string(), sub);
        assert_eq!(session.school_id().unwrap(), school_id);
        assert_eq!(session.read_scope(), Some(school_id));
    }

    #[test]
    fn test_invalid_subject_is_rejected() {
        let mut c = claims(Role::Admin, Some(Uuid::new_v4()));
        c.sub = "not-a-uuid".to_string();
        let err = Session::try_from(c).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_scoped_role_without_school_is_rejected() {
        let err = Session::try_from(claims(Role::Parent, None)).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_superadmin_read_scope_is_unrestricted() {
        let session = Session::try_from(claims(Role::SuperAdmin, None)).unwrap();
        assert_eq!(session.read_scope(), None);
        assert_eq!(session.school_id().unwrap_err().status.as_u16(), 403);
    }

    #[test]
    fn test_resolve_school() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();

        let admin = Session::try_from(claims(Role::Admin, Some(own))).unwrap();
        assert_eq!(admin.resolve_school(Some(other)).unwrap(), own);

        let root = Session::try_from(claims(Role::SuperAdmin, None)).unwrap();
        assert_eq!(root.resolve_school(Some(other)).unwrap(), other);
        assert_eq!(root.resolve_school(None).unwrap_err().status.as_u16(), 400);
    }
}
