use chrono::Utc;
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use scolaris_cache::RedisCache;
use scolaris_cache::keys::invalidate;
use scolaris_core::file_storage::FileStorage;
use scolaris_core::{AppError, PaginationMeta};
use scolaris_models::nsi::{NSI_MAX_ATTEMPTS, generate_nsi};
use scolaris_models::students::{
    CreateStudentDto, PaginatedStudentsResponse, Student, StudentFilterParams, StudentWithClass,
    UpdateStudentDto,
};

use crate::modules::documents::service::DocumentService;
use crate::modules::parents::service::ParentService;

const STUDENT_COLUMNS: &str = "id, school_id, class_id, parent_id, first_name, last_name, date_of_birth, gender, nsi, photo_url, created_at, updated_at";

const STUDENT_WITH_CLASS: &str = r#"
    SELECT s.id, s.school_id, s.class_id, s.parent_id, s.first_name, s.last_name,
        s.date_of_birth, s.gender, s.nsi, s.photo_url, s.created_at, s.updated_at,
        c.name AS class_name
    FROM students s
    JOIN classes c ON c.id = s.class_id
"#;

const NSI_CONSTRAINT: &str = "students_nsi_key";

pub struct StudentService;

impl StudentService {
    async fn ensure_class_in_school<'e>(
        executor: impl PgExecutor<'e>,
        school_id: Uuid,
        class_id: Uuid,
    ) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM classes WHERE id = $1 AND school_id = $2)",
        )
        .bind(class_id)
        .bind(school_id)
        .fetch_one(executor)
        .await?;

        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
        }
        Ok(())
    }

    /// Enrols a student under a freshly generated NSI, retrying on the rare
    /// collision with an existing identifier.
    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "INSERT", db.table = "students"))]
    pub async fn create_student(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateStudentDto,
    ) -> Result<Student, AppError> {
        Self::ensure_class_in_school(db, school_id, dto.class_id).await?;
        if let Some(parent_id) = dto.parent_id {
            ParentService::ensure_in_school(db, school_id, parent_id).await?;
        }

        let today = Utc::now().date_naive();
        for attempt in 1..=NSI_MAX_ATTEMPTS {
            let nsi = generate_nsi(&mut rand::thread_rng(), today);

            let result = sqlx::query_as::<_, Student>(&format!(
                r#"
                INSERT INTO students
                    (school_id, class_id, parent_id, first_name, last_name, date_of_birth, gender, nsi, photo_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING {STUDENT_COLUMNS}
                "#
            ))
            .bind(school_id)
            .bind(dto.class_id)
            .bind(dto.parent_id)
            .bind(dto.first_name.trim())
            .bind(dto.last_name.trim())
            .bind(dto.date_of_birth)
            .bind(&dto.gender)
            .bind(&nsi)
            .bind(&dto.photo_url)
            .fetch_one(db)
            .await;

            match result {
                Ok(student) => {
                    info!(student.id = %student.id, student.nsi = %student.nsi, "Student created");
                    return Ok(student);
                }
                Err(sqlx::Error::Database(db_err))
                    if db_err.constraint() == Some(NSI_CONSTRAINT) =>
                {
                    warn!(attempt, "NSI collision, regenerating");
                }
                Err(e) => {
                    error!(error = %e, "Database error creating student");
                    return Err(AppError::from(e));
                }
            }
        }

        Err(AppError::internal_error(format!(
            "Could not allocate a unique NSI after {NSI_MAX_ATTEMPTS} attempts"
        )))
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "students"))]
    pub async fn list_students(
        db: &PgPool,
        school_id: Uuid,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let mut where_clause = String::from("WHERE s.school_id = $1");
        let mut param_count = 1;

        if filters.class_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND s.class_id = ${param_count}"));
        }
        if filters.parent_id.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND s.parent_id = ${param_count}"));
        }
        if filters.search.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(
                " AND (s.first_name ILIKE ${param_count} OR s.last_name ILIKE ${param_count} OR s.nsi ILIKE ${param_count})"
            ));
        }
        let search = filters.search.as_ref().map(|s| format!("%{s}%"));

        let count_query = format!(
            "SELECT COUNT(*) FROM students s JOIN classes c ON c.id = s.class_id {where_clause}"
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query).bind(school_id);
        if let Some(class_id) = filters.class_id {
            count_builder = count_builder.bind(class_id);
        }
        if let Some(parent_id) = filters.parent_id {
            count_builder = count_builder.bind(parent_id);
        }
        if let Some(ref search) = search {
            count_builder = count_builder.bind(search);
        }
        let total = count_builder.fetch_one(db).await?;

        let data_query = format!(
            "{STUDENT_WITH_CLASS} {where_clause} ORDER BY s.last_name, s.first_name LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        );
        let mut data_builder = sqlx::query_as::<_, StudentWithClass>(&data_query).bind(school_id);
        if let Some(class_id) = filters.class_id {
            data_builder = data_builder.bind(class_id);
        }
        if let Some(parent_id) = filters.parent_id {
            data_builder = data_builder.bind(parent_id);
        }
        if let Some(ref search) = search {
            data_builder = data_builder.bind(search);
        }
        let students = data_builder
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedStudentsResponse {
            data: students,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(student.id = %student_id, db.operation = "SELECT", db.table = "students"))]
    pub async fn get_student(
        db: &PgPool,
        scope: Option<Uuid>,
        student_id: Uuid,
    ) -> Result<StudentWithClass, AppError> {
        sqlx::query_as::<_, StudentWithClass>(&format!(
            "{STUDENT_WITH_CLASS} WHERE s.id = $1 AND ($2::uuid IS NULL OR s.school_id = $2)"
        ))
        .bind(student_id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            debug!("Student not found in scope");
            AppError::not_found(anyhow::anyhow!("Student not found"))
        })
    }

    /// A student of `parent_id`, or 404 when the child is someone else's.
    #[instrument(skip(db), fields(student.id = %student_id, db.operation = "SELECT", db.table = "students"))]
    pub async fn get_child(
        db: &PgPool,
        parent_id: Uuid,
        student_id: Uuid,
    ) -> Result<StudentWithClass, AppError> {
        sqlx::query_as::<_, StudentWithClass>(&format!(
            "{STUDENT_WITH_CLASS} WHERE s.id = $1 AND s.parent_id = $2"
        ))
        .bind(student_id)
        .bind(parent_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
    }

    #[instrument(skip(db), fields(user.id = %parent_id, db.operation = "SELECT", db.table = "students"))]
    pub async fn list_children(
        db: &PgPool,
        parent_id: Uuid,
    ) -> Result<Vec<StudentWithClass>, AppError> {
        let children = sqlx::query_as::<_, StudentWithClass>(&format!(
            "{STUDENT_WITH_CLASS} WHERE s.parent_id = $1 ORDER BY s.first_name"
        ))
        .bind(parent_id)
        .fetch_all(db)
        .await?;
        Ok(children)
    }

    #[instrument(skip(db, cache, dto), fields(student.id = %student_id, db.operation = "UPDATE", db.table = "students"))]
    pub async fn update_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
        student_id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        if let Some(class_id) = dto.class_id {
            Self::ensure_class_in_school(db, school_id, class_id).await?;
        }
        if let Some(parent_id) = dto.parent_id {
            ParentService::ensure_in_school(db, school_id, parent_id).await?;
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students SET
                class_id = COALESCE($3, class_id),
                parent_id = CASE WHEN $4 THEN NULL ELSE COALESCE($5, parent_id) END,
                first_name = COALESCE($6, first_name),
                last_name = COALESCE($7, last_name),
                date_of_birth = COALESCE($8, date_of_birth),
                gender = COALESCE($9, gender),
                photo_url = COALESCE($10, photo_url),
                updated_at = NOW()
            WHERE id = $1 AND school_id = $2
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student_id)
        .bind(school_id)
        .bind(dto.class_id)
        .bind(dto.unlink_parent)
        .bind(dto.parent_id)
        .bind(dto.first_name.as_deref().map(str::trim))
        .bind(dto.last_name.as_deref().map(str::trim))
        .bind(dto.date_of_birth)
        .bind(&dto.gender)
        .bind(&dto.photo_url)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        invalidate::public_result(cache, &student.nsi).await;
        info!("Student updated");
        Ok(student)
    }

    /// Deletes the student; grades, attendance and documents go with it by
    /// cascade. Stored document files are then removed best-effort.
    #[instrument(skip(db, cache, storage), fields(student.id = %student_id, db.operation = "DELETE", db.table = "students"))]
    pub async fn delete_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        storage: &dyn FileStorage,
        school_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), AppError> {
        let storage_keys = sqlx::query_scalar::<_, String>(
            "SELECT storage_key FROM documents WHERE student_id = $1 AND school_id = $2",
        )
        .bind(student_id)
        .bind(school_id)
        .fetch_all(db)
        .await?;

        let nsi = sqlx::query_scalar::<_, String>(
            "DELETE FROM students WHERE id = $1 AND school_id = $2 RETURNING nsi",
        )
        .bind(student_id)
        .bind(school_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        DocumentService::remove_files(storage, &storage_keys).await;
        invalidate::public_result(cache, &nsi).await;

        info!(documents = storage_keys.len(), "Student deleted");
        Ok(())
    }
}
