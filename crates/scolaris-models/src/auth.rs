//! Login, self-registration and "who am I" DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::schools::SchoolView;
use crate::users::User;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

/// A new school signs up together with its first admin account.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterSchoolRequest {
    #[validate(length(min = 1, max = 255, message = "school_name is required"))]
    pub school_name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email(message = "school_email must be a valid email address"))]
    pub school_email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name is required"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
    /// Present for school-scoped accounts
    pub school: Option<SchoolView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable marker, e.g. `school_suspended`
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let req = RegisterSchoolRequest {
            school_name: String::new(),
            address: None,
            phone: None,
            school_email: None,
            first_name: "Moussa".to_string(),
            last_name: "Diop".to_string(),
            email: "moussa@school.sn".to_string(),
            password: "password123".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("school_name"));
    }

    #[test]
    fn test_login_request_deserialize() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.sn","password":"secret"}"#).unwrap();
        assert_eq!(req.email, "a@b.sn");
        assert!(req.validate().is_ok());
    }
}
