use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use scolaris_core::serde::{deserialize_optional_trimmed, deserialize_optional_uuid};
use scolaris_core::{PaginationMeta, PaginationParams};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "grade_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GradeType {
    Homework,
    Test,
    Exam,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    /// Mark out of 20
    pub value: f64,
    pub grade_type: GradeType,
    pub period: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GradeWithDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub grade: Grade,
    pub subject_name: String,
    pub student_first_name: String,
    pub student_last_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGradeDto {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    #[validate(range(min = 0.0, max = 20.0, message = "value must be between 0 and 20"))]
    pub value: f64,
    pub grade_type: GradeType,
    #[validate(length(min = 1, max = 50, message = "period is required"))]
    pub period: String,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateGradeDto {
    #[validate(range(min = 0.0, max = 20.0, message = "value must be between 0 and 20"))]
    pub value: Option<f64>,
    pub grade_type: Option<GradeType>,
    #[validate(length(min = 1, max = 50))]
    pub period: Option<String>,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkGradeEntry {
    pub student_id: Uuid,
    #[validate(range(min = 0.0, max = 20.0, message = "value must be between 0 and 20"))]
    pub value: f64,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// One subject, one evaluation, many students.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkGradeDto {
    pub subject_id: Uuid,
    pub grade_type: GradeType,
    #[validate(length(min = 1, max = 50, message = "period is required"))]
    pub period: String,
    #[validate(
        length(min = 1, max = 500, message = "entries must contain between 1 and 500 grades"),
        nested
    )]
    pub entries: Vec<BulkGradeEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkGradeResponse {
    pub inserted: usize,
    pub grades: Vec<Grade>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GradeFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub period: Option<String>,
    pub grade_type: Option<GradeType>,
    /// Superadmin only: the school to list
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedGradesResponse {
    pub data: Vec<GradeWithDetails>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_value_bounds() {
        let entry = |value| BulkGradeEntry {
            student_id: Uuid::new_v4(),
            value,
            comment: None,
        };
        assert!(entry(0.0).validate().is_ok());
        assert!(entry(20.0).validate().is_ok());
        assert!(entry(20.5).validate().is_err());
        assert!(entry(-1.0).validate().is_err());
    }

    #[test]
    fn test_bulk_validates_nested_entries() {
        let dto = BulkGradeDto {
            subject_id: Uuid::new_v4(),
            grade_type: GradeType::Test,
            period: "T1".to_string(),
            entries: vec![BulkGradeEntry {
                student_id: Uuid::new_v4(),
                value: 25.0,
                comment: None,
            }],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_bulk_rejects_empty_entries() {
        let dto = BulkGradeDto {
            subject_id: Uuid::new_v4(),
            grade_type: GradeType::Exam,
            period: "T2".to_string(),
            entries: vec![],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_grade_type_serde() {
        let t: GradeType = serde_json::from_str(r#""homework""#).unwrap();
        assert_eq!(t, GradeType::Homework);
    }
}
