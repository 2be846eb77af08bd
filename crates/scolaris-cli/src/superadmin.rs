//! Platform operator bootstrap.
//!
//! Superadmins cannot self-register through the API, so the first account is
//! created here.

use scolaris_auth::Role;
use scolaris_core::hash_password;
use scolaris_models::users::{CreateSuperAdminDto, normalize_email};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub async fn create_superadmin(
    db: &PgPool,
    dto: CreateSuperAdminDto,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    dto.validate()?;

    let email = normalize_email(&dto.email);
    let hashed_password =
        hash_password(&dto.password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (first_name, last_name, email, password, role, school_id)
         VALUES ($1, $2, $3, $4, $5, NULL)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(dto.first_name.trim())
    .bind(dto.last_name.trim())
    .bind(&email)
    .bind(&hashed_password)
    .bind(Role::SuperAdmin)
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| "User with this email already exists".into())
}
