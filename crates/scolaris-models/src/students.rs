//! Student models, DTOs and the public result lookup view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use scolaris_core::serde::{deserialize_optional_trimmed, deserialize_optional_uuid};
use scolaris_core::{PaginationMeta, PaginationParams};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub school_id: Uuid,
    pub class_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    /// Public identifier used for result lookup
    pub nsi: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Student row joined with its class name, used in listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StudentWithClass {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub student: Student,
    pub class_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
    pub class_id: Uuid,
    pub parent_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name is required"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    #[validate(url(message = "photo_url must be a valid URL"))]
    pub photo_url: Option<String>,
}

/// Only provided fields change. `parent_id: null` is indistinguishable
/// from absent, so unlinking a parent uses `unlink_parent`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    pub class_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub unlink_parent: bool,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    #[validate(url(message = "photo_url must be a valid URL"))]
    pub photo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub parent_id: Option<Uuid>,
    /// Matches first name, last name or NSI
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    /// Superadmin only: the school to list
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<StudentWithClass>,
    pub meta: PaginationMeta,
}

/// Header row of a public lookup.
#[derive(Debug, Clone, FromRow)]
pub struct PublicStudentRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub nsi: String,
    pub class_name: String,
    pub school_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubjectAverage {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub coefficient: i32,
    pub average: f64,
    pub grade_count: i64,
}

/// What anyone holding an NSI may see: identity, class and averages.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicStudentResult {
    pub nsi: String,
    pub first_name: String,
    pub last_name: String,
    pub class_name: String,
    pub school_name: String,
    pub subjects: Vec<SubjectAverage>,
    /// Coefficient-weighted mean of the subject averages
    pub overall_average: Option<f64>,
}

/// Weighted mean of subject averages; `None` when nothing is graded.
pub fn weighted_average(subjects: &[SubjectAverage]) -> Option<f64> {
    let (sum, weight) = subjects
        .iter()
        .filter(|s| s.grade_count > 0)
        .fold((0.0, 0i64), |(sum, weight), s| {
            (sum + s.average * f64::from(s.coefficient), weight + i64::from(s.coefficient))
        });

    if weight == 0 {
        None
    } else {
        Some(round2(sum / weight as f64))
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
