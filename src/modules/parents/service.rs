use anyhow::Context;
use sqlx::{PgExecutor, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use scolaris_auth::Role;
use scolaris_core::{AppError, PaginationMeta, hash_password};
use scolaris_models::users::{
    CreateParentDto, PaginatedParentsResponse, ParentFilterParams, ParentWithChildren,
    UpdateParentDto, User, normalize_email,
};

use crate::modules::auth::service::USER_COLUMNS;

const PARENT_WITH_CHILDREN: &str = r#"
    SELECT u.id, u.first_name, u.last_name, u.email, u.phone, u.role, u.school_id,
        u.created_at, u.updated_at,
        (SELECT COUNT(*) FROM students s WHERE s.parent_id = u.id) AS children_count
    FROM users u
"#;

fn map_email_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!("Parent email already registered");
        return AppError::conflict(anyhow::anyhow!("Email already registered"));
    }
    AppError::from(e)
}

pub struct ParentService;

impl ParentService {
    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "INSERT", db.table = "users"))]
    pub async fn create_parent(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateParentDto,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(&dto.password)?;

        let parent = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password, phone, role, school_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(normalize_email(&dto.email))
        .bind(&hashed_password)
        .bind(&dto.phone)
        .bind(Role::Parent)
        .bind(school_id)
        .fetch_one(db)
        .await
        .map_err(map_email_conflict)?;

        info!(user.id = %parent.id, "Parent account created");
        Ok(parent)
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn list_parents(
        db: &PgPool,
        school_id: Uuid,
        filters: ParentFilterParams,
    ) -> Result<PaginatedParentsResponse, AppError> {
        let search = filters.search.as_ref().map(|s| format!("%{s}%"));
        let where_clause = r#"
            WHERE u.school_id = $1 AND u.role = 'parent'
              AND ($2::text IS NULL
                   OR u.first_name ILIKE $2 OR u.last_name ILIKE $2 OR u.email ILIKE $2)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM users u {where_clause}"
        ))
        .bind(school_id)
        .bind(&search)
        .fetch_one(db)
        .await
        .context("Failed to count parents")
        .map_err(AppError::database)?;

        let parents = sqlx::query_as::<_, ParentWithChildren>(&format!(
            "{PARENT_WITH_CHILDREN} {where_clause} ORDER BY u.last_name, u.first_name LIMIT $3 OFFSET $4"
        ))
        .bind(school_id)
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch parents")
        .map_err(AppError::database)?;

        Ok(PaginatedParentsResponse {
            data: parents,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(user.id = %parent_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn get_parent(
        db: &PgPool,
        scope: Option<Uuid>,
        parent_id: Uuid,
    ) -> Result<ParentWithChildren, AppError> {
        sqlx::query_as::<_, ParentWithChildren>(&format!(
            "{PARENT_WITH_CHILDREN} WHERE u.id = $1 AND u.role = 'parent' AND ($2::uuid IS NULL OR u.school_id = $2)"
        ))
        .bind(parent_id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Parent not found")))
    }

    /// Confirms `parent_id` is a parent account of `school_id`.
    pub async fn ensure_in_school<'e>(
        executor: impl PgExecutor<'e>,
        school_id: Uuid,
        parent_id: Uuid,
    ) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND school_id = $2 AND role = 'parent')",
        )
        .bind(parent_id)
        .bind(school_id)
        .fetch_one(executor)
        .await?;

        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Parent not found")));
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(user.id = %parent_id, db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_parent(
        db: &PgPool,
        school_id: Uuid,
        parent_id: Uuid,
        dto: UpdateParentDto,
    ) -> Result<User, AppError> {
        let hashed_password = dto.password.as_deref().map(hash_password).transpose()?;

        let parent = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                email = COALESCE($5, email),
                password = COALESCE($6, password),
                phone = COALESCE($7, phone),
                updated_at = NOW()
            WHERE id = $1 AND school_id = $2 AND role = 'parent'
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(parent_id)
        .bind(school_id)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(dto.email.as_deref().map(normalize_email))
        .bind(&hashed_password)
        .bind(&dto.phone)
        .fetch_optional(db)
        .await
        .map_err(map_email_conflict)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Parent not found")))?;

        info!("Parent account updated");
        Ok(parent)
    }

    /// Deletes the account; linked students keep their records with no parent.
    #[instrument(skip(db), fields(user.id = %parent_id, db.operation = "DELETE", db.table = "users"))]
    pub async fn delete_parent(
        db: &PgPool,
        school_id: Uuid,
        parent_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND school_id = $2 AND role = 'parent'")
            .bind(parent_id)
            .bind(school_id)
            .execute(db)
            .await
            .context("Failed to delete parent")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Parent not found")));
        }

        info!("Parent account deleted");
        Ok(())
    }
}
