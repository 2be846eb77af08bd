//! Tenant access policy.
//!
//! Every protected request is judged once by [`authorize`] (role and scope)
//! and, for mutating tenant requests, by [`authorize_write`] which also
//! considers the school's subscription standing.

use scolaris_core::AppError;

use crate::role::Role;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ReadSchoolData,
    WriteSchoolData,
    ReadOwnChildren,
    ManagePlatform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    RoleNotPermitted,
    MissingSchoolScope,
    SchoolSuspended,
    SubscriptionExpired,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::RoleNotPermitted => "role_not_permitted",
            DenyReason::MissingSchoolScope => "missing_school_scope",
            DenyReason::SchoolSuspended => "school_suspended",
            DenyReason::SubscriptionExpired => "subscription_expired",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::RoleNotPermitted => "Your role does not allow this action",
            DenyReason::MissingSchoolScope => "This action requires a school account",
            DenyReason::SchoolSuspended => "School is suspended",
            DenyReason::SubscriptionExpired => "School subscription has expired",
        }
    }

    /// 403 response carrying the stable reason code.
    pub fn into_error(self) -> AppError {
        AppError::forbidden(self.message().to_string()).with_code(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason.into_error()),
        }
    }
}

/// Whether a school's subscription currently admits writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolStanding {
    Writable,
    Suspended,
    Expired,
}

pub fn authorize(session: &Session, capability: Capability) -> Decision {
    match (capability, session.role) {
        (Capability::ManagePlatform, Role::SuperAdmin) => Decision::Allow,
        (Capability::ReadSchoolData, Role::SuperAdmin) => Decision::Allow,
        (Capability::ReadSchoolData | Capability::WriteSchoolData, Role::Admin) => {
            if session.school_id.is_some() {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::MissingSchoolScope)
            }
        }
        (Capability::ReadOwnChildren, Role::Parent) => {
            if session.school_id.is_some() {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::MissingSchoolScope)
            }
        }
        _ => Decision::Deny(DenyReason::RoleNotPermitted),
    }
}

/// Write check for school-scoped callers: the role must be allowed to write
/// and the school must be neither suspended nor expired.
pub fn authorize_write(session: &Session, standing: SchoolStanding) -> Decision {
    match authorize(session, Capability::WriteSchoolData) {
        Decision::Allow => match standing {
            SchoolStanding::Writable => Decision::Allow,
            SchoolStanding::Suspended => Decision::Deny(DenyReason::SchoolSuspended),
            SchoolStanding::Expired => Decision::Deny(DenyReason::SubscriptionExpired),
        },
        denied => denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(role: Role, school_id: Option<Uuid>) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            role,
            school_id,
        }
    }

    #[test]
    fn test_admin_reads_and_writes_own_school() {
        let admin = session(Role::Admin, Some(Uuid::new_v4()));
        assert!(authorize(&admin, Capability::ReadSchoolData).is_allowed());
        assert!(authorize(&admin, Capability::WriteSchoolData).is_allowed());
        assert_eq!(
            authorize(&admin, Capability::ManagePlatform),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
        assert_eq!(
            authorize(&admin, Capability::ReadOwnChildren),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
    }

    #[test]
    fn test_admin_without_school_is_denied() {
        let admin = session(Role::Admin, None);
        assert_eq!(
            authorize(&admin, Capability::ReadSchoolData),
            Decision::Deny(DenyReason::MissingSchoolScope)
        );
    }

    #[test]
    fn test_superadmin_reads_but_does_not_write_tenant_data() {
        let root = session(Role::SuperAdmin, None);
        assert!(authorize(&root, Capability::ReadSchoolData).is_allowed());
        assert!(authorize(&root, Capability::ManagePlatform).is_allowed());
        assert_eq!(
            authorize(&root, Capability::WriteSchoolData),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
    }

    #[test]
    fn test_parent_only_reads_children() {
        let parent = session(Role::Parent, Some(Uuid::new_v4()));
        assert!(authorize(&parent, Capability::ReadOwnChildren).is_allowed());
        assert!(!authorize(&parent, Capability::ReadSchoolData).is_allowed());
        assert!(!authorize(&parent, Capability::WriteSchoolData).is_allowed());
    }

    #[test]
    fn test_write_gate_follows_standing() {
        let admin = session(Role::Admin, Some(Uuid::new_v4()));
        assert!(authorize_write(&admin, SchoolStanding::Writable).is_allowed());
        assert_eq!(
            authorize_write(&admin, SchoolStanding::Suspended),
            Decision::Deny(DenyReason::SchoolSuspended)
        );
        assert_eq!(
            authorize_write(&admin, SchoolStanding::Expired),
            Decision::Deny(DenyReason::SubscriptionExpired)
        );
    }

    #[test]
    fn test_role_denial_wins_over_standing() {
        let parent = session(Role::Parent, Some(Uuid::new_v4()));
        assert_eq!(
            authorize_write(&parent, SchoolStanding::Suspended),
            Decision::Deny(DenyReason::RoleNotPermitted)
        );
    }

    #[test]
    fn test_denial_maps_to_403_with_code() {
        let err = Decision::Deny(DenyReason::SchoolSuspended)
            .into_result()
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.code, Some("school_suspended"));
    }
}
