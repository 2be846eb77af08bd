use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use scolaris_core::{AppError, PaginationMeta};
use scolaris_models::subjects::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, SubjectFilterParams, UpdateSubjectDto,
};

const SUBJECT_COLUMNS: &str = "id, school_id, name, coefficient, created_at, updated_at";

fn map_name_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!("Subject name already used in school");
        return AppError::conflict(anyhow::anyhow!("A subject with this name already exists"));
    }
    AppError::from(e)
}

pub struct SubjectService;

impl SubjectService {
    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "INSERT", db.table = "subjects"))]
    pub async fn create_subject(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateSubjectDto,
    ) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "INSERT INTO subjects (school_id, name, coefficient) VALUES ($1, $2, $3) RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.name.trim())
        .bind(dto.coefficient)
        .fetch_one(db)
        .await
        .map_err(map_name_conflict)?;

        info!(subject.id = %subject.id, "Subject created");
        Ok(subject)
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "subjects"))]
    pub async fn list_subjects(
        db: &PgPool,
        school_id: Uuid,
        filters: SubjectFilterParams,
    ) -> Result<PaginatedSubjectsResponse, AppError> {
        let name_pattern = filters.name.as_ref().map(|name| format!("%{name}%"));

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subjects WHERE school_id = $1 AND ($2::text IS NULL OR name ILIKE $2)",
        )
        .bind(school_id)
        .bind(&name_pattern)
        .fetch_one(db)
        .await?;

        let subjects = sqlx::query_as::<_, Subject>(&format!(
            r#"
            SELECT {SUBJECT_COLUMNS} FROM subjects
            WHERE school_id = $1 AND ($2::text IS NULL OR name ILIKE $2)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(school_id)
        .bind(&name_pattern)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedSubjectsResponse {
            data: subjects,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(subject.id = %subject_id, db.operation = "SELECT", db.table = "subjects"))]
    pub async fn get_subject(
        db: &PgPool,
        scope: Option<Uuid>,
        subject_id: Uuid,
    ) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(subject_id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subject not found")))
    }

    #[instrument(skip(db, dto), fields(subject.id = %subject_id, db.operation = "UPDATE", db.table = "subjects"))]
    pub async fn update_subject(
        db: &PgPool,
        school_id: Uuid,
        subject_id: Uuid,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!(
            r#"
            UPDATE subjects SET
                name = COALESCE($3, name),
                coefficient = COALESCE($4, coefficient),
                updated_at = NOW()
            WHERE id = $1 AND school_id = $2
            RETURNING {SUBJECT_COLUMNS}
            "#
        ))
        .bind(subject_id)
        .bind(school_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.coefficient)
        .fetch_optional(db)
        .await
        .map_err(map_name_conflict)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subject not found")))
    }

    /// Removes the subject and, by cascade, every grade recorded against it.
    #[instrument(skip(db), fields(subject.id = %subject_id, db.operation = "DELETE", db.table = "subjects"))]
    pub async fn delete_subject(
        db: &PgPool,
        school_id: Uuid,
        subject_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1 AND school_id = $2")
            .bind(subject_id)
            .bind(school_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Subject not found")));
        }

        info!("Subject deleted");
        Ok(())
    }
}
