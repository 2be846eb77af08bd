use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use scolaris_auth::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    #[serde(skip_serializing)]
    pub storage_key: Option<String>,
    pub show_on_login: bool,
    pub show_on_admin: bool,
    pub show_on_parent: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Where a notification is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    LoginPage,
    AdminDashboard,
    ParentDashboard,
    Everywhere,
}

impl Audience {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Audience::AdminDashboard,
            Role::Parent => Audience::ParentDashboard,
            Role::SuperAdmin => Audience::Everywhere,
        }
    }

    /// Flag column that must be true, `None` for no filter.
    pub fn flag_column(&self) -> Option<&'static str> {
        match self {
            Audience::LoginPage => Some("show_on_login"),
            Audience::AdminDashboard => Some("show_on_admin"),
            Audience::ParentDashboard => Some("show_on_parent"),
            Audience::Everywhere => None,
        }
    }
}

/// Text fields of a notification, collected from the multipart form.
#[derive(Debug, Default, Validate)]
pub struct NewNotification {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "message is required"))]
    pub message: String,
    pub show_on_login: bool,
    pub show_on_admin: bool,
    pub show_on_parent: bool,
}

/// Multipart body of `POST /api/notifications`, for the OpenAPI schema.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateNotificationForm {
    pub title: String,
    pub message: String,
    pub show_on_login: Option<bool>,
    pub show_on_admin: Option<bool>,
    pub show_on_parent: Option<bool>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub media: Option<Vec<u8>>,
}

/// Checkbox-style form values: `true`, `on`, `1` and `yes` are set.
pub fn parse_form_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}
