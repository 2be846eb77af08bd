//! School (tenant) models, admin console DTOs and platform stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use scolaris_core::serde::deserialize_optional_trimmed;
use scolaris_core::{PaginationMeta, PaginationParams};

use crate::subscription::{Subscription, SubscriptionState, SubscriptionSummary};

/// Manual override status, stored as the `school_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "school_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SchoolStatus {
    Active,
    Suspended,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: SchoolStatus,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub paused_remaining_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl School {
    pub fn subscription(&self) -> Subscription {
        Subscription {
            status: self.status,
            end_date: self.subscription_end_date,
            is_paused: self.is_paused,
            paused_remaining_ms: self.paused_remaining_ms,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> SchoolView {
        SchoolView {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            subscription: self.subscription().summary(now),
        }
    }
}

/// A school as returned by the API, with its effective subscription state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SchoolView {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subscription: SubscriptionSummary,
}

/// School admins edit their own school's contact details.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
}

/// Superadmin edit: school details plus the login email of its admin.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminUpdateSchoolDto {
    #[validate(length(min = 1, max = 255, message = "name must be between 1 and 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(email(message = "admin_email must be a valid email address"))]
    pub admin_email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendSubscriptionDto {
    /// Whole days to add; negative values shorten the subscription.
    pub days: i64,
}

pub const MAX_EXTEND_DAYS: i64 = 3650;

impl Validate for ExtendSubscriptionDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        if self.days.abs() > MAX_EXTEND_DAYS {
            let mut err = ValidationError::new("range");
            err.message = Some("days must be between -3650 and 3650".into());
            let mut errors = ValidationErrors::new();
            errors.add("days", err);
            return Err(errors);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchoolFilterParams {
    /// Case-insensitive match on the school name
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    /// Effective subscription state
    pub state: Option<SubscriptionState>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<SchoolView>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SchoolAdminInfo {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
pub struct SchoolCounts {
    pub student_count: i64,
    pub class_count: i64,
    pub user_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchoolDetail {
    #[serde(flatten)]
    pub school: SchoolView,
    pub counts: SchoolCounts,
    pub admins: Vec<SchoolAdminInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SchoolStateCounts {
    pub active: i64,
    pub paused: i64,
    pub suspended: i64,
    pub expired: i64,
}

impl SchoolStateCounts {
    pub fn record(&mut self, state: SubscriptionState) {
        match state {
            SubscriptionState::Active => self.active += 1,
            SubscriptionState::Paused => self.paused += 1,
            SubscriptionState::Suspended => self.suspended += 1,
            SubscriptionState::Expired => self.expired += 1,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlatformStats {
    pub schools_total: i64,
    pub schools_by_state: SchoolStateCounts,
    pub students_total: i64,
    pub users_total: i64,
    pub parents_total: i64,
}
