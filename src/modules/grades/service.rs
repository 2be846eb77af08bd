use std::collections::HashSet;

use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use scolaris_core::{AppError, PaginationMeta};
use scolaris_models::grades::{
    BulkGradeDto, BulkGradeResponse, CreateGradeDto, Grade, GradeFilterParams, GradeWithDetails,
    PaginatedGradesResponse, UpdateGradeDto,
};

use crate::metrics;

const GRADE_COLUMNS: &str =
    "id, student_id, subject_id, value, grade_type, period, comment, created_at, updated_at";

const GRADE_WITH_DETAILS: &str = r#"
    SELECT g.id, g.student_id, g.subject_id, g.value, g.grade_type, g.period, g.comment,
        g.created_at, g.updated_at,
        sub.name AS subject_name,
        s.first_name AS student_first_name,
        s.last_name AS student_last_name
    FROM grades g
    JOIN students s ON s.id = g.student_id
    JOIN subjects sub ON sub.id = g.subject_id
"#;

pub struct GradeService;

impl GradeService {
    async fn ensure_subject_in_school<'e>(
        executor: impl PgExecutor<'e>,
        school_id: Uuid,
        subject_id: Uuid,
    ) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM subjects WHERE id = $1 AND school_id = $2)",
        )
        .bind(subject_id)
        .bind(school_id)
        .fetch_one(executor)
        .await?;

        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Subject not found")));
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "INSERT", db.table = "grades"))]
    pub async fn create_grade(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateGradeDto,
    ) -> Result<Grade, AppError> {
        let student_in_school = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM students WHERE id = $1 AND school_id = $2)",
        )
        .bind(dto.student_id)
        .bind(school_id)
        .fetch_one(db)
        .await?;
        if !student_in_school {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }
        Self::ensure_subject_in_school(db, school_id, dto.subject_id).await?;

        let grade = sqlx::query_as::<_, Grade>(&format!(
            r#"
            INSERT INTO grades (student_id, subject_id, value, grade_type, period, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {GRADE_COLUMNS}
            "#
        ))
        .bind(dto.student_id)
        .bind(dto.subject_id)
        .bind(dto.value)
        .bind(dto.grade_type)
        .bind(dto.period.trim())
        .bind(&dto.comment)
        .fetch_one(db)
        .await?;

        metrics::track_grades_recorded(1);
        info!(grade.id = %grade.id, "Grade recorded");
        Ok(grade)
    }

    /// Records one evaluation for many students. Either every entry is
    /// inserted or none is.
    #[instrument(skip(db, dto), fields(school.id = %school_id, entries = dto.entries.len(), db.operation = "INSERT", db.table = "grades"))]
    pub async fn bulk_create_grades(
        db: &PgPool,
        school_id: Uuid,
        dto: BulkGradeDto,
    ) -> Result<BulkGradeResponse, AppError> {
        let student_ids: Vec<Uuid> = dto
            .entries
            .iter()
            .map(|e| e.student_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut tx = db.begin().await?;

        Self::ensure_subject_in_school(&mut *tx, school_id, dto.subject_id).await?;

        let in_school = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students WHERE id = ANY($1) AND school_id = $2",
        )
        .bind(&student_ids)
        .bind(school_id)
        .fetch_one(&mut *tx)
        .await?;

        if in_school != student_ids.len() as i64 {
            warn!(
                requested = student_ids.len(),
                found = in_school,
                "Bulk grade entry references students outside the school"
            );
            return Err(AppError::not_found(anyhow::anyhow!(
                "One or more students not found"
            )));
        }

        let period = dto.period.trim();
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO grades (student_id, subject_id, value, grade_type, period, comment) ",
        );
        query.push_values(&dto.entries, |mut row, entry| {
            row.push_bind(entry.student_id)
                .push_bind(dto.subject_id)
                .push_bind(entry.value)
                .push_bind(dto.grade_type)
                .push_bind(period)
                .push_bind(&entry.comment);
        });
        query.push(format!(" RETURNING {GRADE_COLUMNS}"));

        let grades: Vec<Grade> = query.build_query_as().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        metrics::track_grades_recorded(grades.len());
        info!(inserted = grades.len(), "Bulk grades recorded");

        Ok(BulkGradeResponse {
            inserted: grades.len(),
            grades,
        })
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "grades"))]
    pub async fn list_grades(
        db: &PgPool,
        school_id: Uuid,
        filters: GradeFilterParams,
    ) -> Result<PaginatedGradesResponse, AppError> {
        let mut where_clause = String::from("WHERE s.school_id = $1");
        let mut param_count = 1;

        if filters.student_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND g.student_id = ${param_count}"));
        }
        if filters.subject_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND g.subject_id = ${param_count}"));
        }
        if filters.class_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND s.class_id = ${param_count}"));
        }
        if filters.period.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND g.period = ${param_count}"));
        }
        if filters.grade_type.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND g.grade_type = ${param_count}"));
        }

        let count_query = format!(
            "SELECT COUNT(*) FROM grades g JOIN students s ON s.id = g.student_id {where_clause}"
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query).bind(school_id);
        if let Some(student_id) = filters.student_id {
            count_builder = count_builder.bind(student_id);
        }
        if let Some(subject_id) = filters.subject_id {
            count_builder = count_builder.bind(subject_id);
        }
        if let Some(class_id) = filters.class_id {
            count_builder = count_builder.bind(class_id);
        }
        if let Some(ref period) = filters.period {
            count_builder = count_builder.bind(period);
        }
        if let Some(grade_type) = filters.grade_type {
            count_builder = count_builder.bind(grade_type);
        }
        let total = count_builder.fetch_one(db).await?;

        let data_query = format!(
            "{GRADE_WITH_DETAILS} {where_clause} ORDER BY g.created_at DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );
        let mut data_builder = sqlx::query_as::<_, GradeWithDetails>(&data_query).bind(school_id);
        if let Some(student_id) = filters.student_id {
            data_builder = data_builder.bind(student_id);
        }
        if let Some(subject_id) = filters.subject_id {
            data_builder = data_builder.bind(subject_id);
        }
        if let Some(class_id) = filters.class_id {
            data_builder = data_builder.bind(class_id);
        }
        if let Some(ref period) = filters.period {
            data_builder = data_builder.bind(period);
        }
        if let Some(grade_type) = filters.grade_type {
            data_builder = data_builder.bind(grade_type);
        }
        let grades = data_builder
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedGradesResponse {
            data: grades,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(grade.id = %grade_id, db.operation = "SELECT", db.table = "grades"))]
    pub async fn get_grade(
        db: &PgPool,
        scope: Option<Uuid>,
        grade_id: Uuid,
    ) -> Result<GradeWithDetails, AppError> {
        sqlx::query_as::<_, GradeWithDetails>(&format!(
            "{GRADE_WITH_DETAILS} WHERE g.id = $1 AND ($2::uuid IS NULL OR s.school_id = $2)"
        ))
        .bind(grade_id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Grade not found")))
    }

    #[instrument(skip(db, dto), fields(grade.id = %grade_id, db.operation = "UPDATE", db.table = "grades"))]
    pub async fn update_grade(
        db: &PgPool,
        school_id: Uuid,
        grade_id: Uuid,
        dto: UpdateGradeDto,
    ) -> Result<Grade, AppError> {
        let grade = sqlx::query_as::<_, Grade>(&format!(
            r#"
            UPDATE grades SET
                value = COALESCE($3, value),
                grade_type = COALESCE($4, grade_type),
                period = COALESCE($5, period),
                comment = COALESCE($6, comment),
                updated_at = NOW()
            WHERE id = $1
              AND student_id IN (SELECT id FROM students WHERE school_id = $2)
            RETURNING {GRADE_COLUMNS}
            "#
        ))
        .bind(grade_id)
        .bind(school_id)
        .bind(dto.value)
        .bind(dto.grade_type)
        .bind(dto.period.as_deref().map(str::trim))
        .bind(&dto.comment)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Grade not found")))?;

        info!("Grade updated");
        Ok(grade)
    }

    #[instrument(skip(db), fields(grade.id = %grade_id, db.operation = "DELETE", db.table = "grades"))]
    pub async fn delete_grade(db: &PgPool, school_id: Uuid, grade_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM grades
            WHERE id = $1 AND student_id IN (SELECT id FROM students WHERE school_id = $2)
            "#,
        )
        .bind(grade_id)
        .bind(school_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Grade not found")));
        }

        info!("Grade deleted");
        Ok(())
    }
}
