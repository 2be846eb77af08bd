use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role, stored as the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Parent,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Parent => "parent",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Every role except the superadmin is bound to a school.
    pub fn is_school_scoped(&self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            r#""super_admin""#
        );
        let role: Role = serde_json::from_str(r#""parent""#).unwrap();
        assert_eq!(role, Role::Parent);
    }

    #[test]
    fn test_school_scoped_roles() {
        assert!(Role::Admin.is_school_scoped());
        assert!(Role::Parent.is_school_scoped());
        assert!(!Role::SuperAdmin.is_school_scoped());
    }

    #[test]
    fn test_display_matches_db_label() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::SuperAdmin.to_string(), "super_admin");
    }
}
