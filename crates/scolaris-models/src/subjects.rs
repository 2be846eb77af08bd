use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use scolaris_core::serde::{deserialize_optional_trimmed, deserialize_optional_uuid};
use scolaris_core::{PaginationMeta, PaginationParams};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    /// Weight of the subject in the overall average
    pub coefficient: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_coefficient() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectDto {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(default = "default_coefficient")]
    #[validate(range(min = 1, max = 20, message = "coefficient must be between 1 and 20"))]
    pub coefficient: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSubjectDto {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 20, message = "coefficient must be between 1 and 20"))]
    pub coefficient: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubjectFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub name: Option<String>,
    /// Superadmin only: the school to list
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSubjectsResponse {
    pub data: Vec<Subject>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficient_defaults_to_one() {
        let dto: CreateSubjectDto = serde_json::from_str(r#"{"name":"Mathématiques"}"#).unwrap();
        assert_eq!(dto.coefficient, 1);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_coefficient_must_be_positive() {
        let dto = CreateSubjectDto {
            name: "Philosophie".to_string(),
            coefficient: 0,
        };
        assert!(dto.validate().is_err());
    }
}
