use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use scolaris_core::{AppError, PaginationMeta};
use scolaris_models::classes::{
    Class, ClassFilterParams, ClassWithStats, CreateClassDto, PaginatedClassesResponse,
    UpdateClassDto,
};

const CLASS_COLUMNS: &str = "c.id, c.school_id, c.name, c.level, c.created_at, c.updated_at";

fn map_name_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!("Class name already used in school");
        return AppError::conflict(anyhow::anyhow!("A class with this name already exists"));
    }
    AppError::from(e)
}

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "INSERT", db.table = "classes"))]
    pub async fn create_class(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateClassDto,
    ) -> Result<Class, AppError> {
        let class = sqlx::query_as::<_, Class>(
            r#"
            INSERT INTO classes (school_id, name, level)
            VALUES ($1, $2, $3)
            RETURNING id, school_id, name, level, created_at, updated_at
            "#,
        )
        .bind(school_id)
        .bind(dto.name.trim())
        .bind(&dto.level)
        .fetch_one(db)
        .await
        .map_err(map_name_conflict)?;

        info!(class.id = %class.id, class.name = %class.name, "Class created");
        Ok(class)
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "classes"))]
    pub async fn list_classes(
        db: &PgPool,
        school_id: Uuid,
        filters: ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        let mut where_clause = String::from("c.school_id = $1");
        let mut param_count = 1;

        if filters.name.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND c.name ILIKE ${param_count}"));
        }
        if filters.level.is_some() {
            param_count += 1;
            where_clause.push_str(&format!(" AND c.level = ${param_count}"));
        }

        let count_query = format!("SELECT COUNT(*) FROM classes c WHERE {where_clause}");
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query).bind(school_id);
        if let Some(ref name) = filters.name {
            count_builder = count_builder.bind(format!("%{name}%"));
        }
        if let Some(ref level) = filters.level {
            count_builder = count_builder.bind(level);
        }
        let total = count_builder.fetch_one(db).await?;

        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let data_query = format!(
            r#"
            SELECT {CLASS_COLUMNS},
                (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count
            FROM classes c
            WHERE {where_clause}
            ORDER BY c.name
            LIMIT ${} OFFSET ${}
            "#,
            param_count + 1,
            param_count + 2
        );
        let mut data_builder = sqlx::query_as::<_, ClassWithStats>(&data_query).bind(school_id);
        if let Some(ref name) = filters.name {
            data_builder = data_builder.bind(format!("%{name}%"));
        }
        if let Some(ref level) = filters.level {
            data_builder = data_builder.bind(level);
        }
        let classes = data_builder.bind(limit).bind(offset).fetch_all(db).await?;

        Ok(PaginatedClassesResponse {
            data: classes,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Looks a class up within `scope`; `None` means any school.
    #[instrument(skip(db), fields(class.id = %class_id, db.operation = "SELECT", db.table = "classes"))]
    pub async fn get_class(
        db: &PgPool,
        scope: Option<Uuid>,
        class_id: Uuid,
    ) -> Result<ClassWithStats, AppError> {
        sqlx::query_as::<_, ClassWithStats>(&format!(
            r#"
            SELECT {CLASS_COLUMNS},
                (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count
            FROM classes c
            WHERE c.id = $1 AND ($2::uuid IS NULL OR c.school_id = $2)
            "#
        ))
        .bind(class_id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            debug!("Class not found in scope");
            AppError::not_found(anyhow::anyhow!("Class not found"))
        })
    }

    #[instrument(skip(db, dto), fields(class.id = %class_id, db.operation = "UPDATE", db.table = "classes"))]
    pub async fn update_class(
        db: &PgPool,
        school_id: Uuid,
        class_id: Uuid,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        let class = sqlx::query_as::<_, Class>(
            r#"
            UPDATE classes SET
                name = COALESCE($3, name),
                level = COALESCE($4, level),
                updated_at = NOW()
            WHERE id = $1 AND school_id = $2
            RETURNING id, school_id, name, level, created_at, updated_at
            "#,
        )
        .bind(class_id)
        .bind(school_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.level)
        .fetch_optional(db)
        .await
        .map_err(map_name_conflict)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))?;

        info!(class.name = %class.name, "Class updated");
        Ok(class)
    }

    /// Fails with 409 while students are still enrolled.
    #[instrument(skip(db), fields(class.id = %class_id, db.operation = "DELETE", db.table = "classes"))]
    pub async fn delete_class(db: &PgPool, school_id: Uuid, class_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1 AND school_id = $2")
            .bind(class_id)
            .bind(school_id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    warn!("Attempted to delete a class that still has students");
                    return AppError::conflict(anyhow::anyhow!(
                        "Cannot delete a class that still has students"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
        }

        info!("Class deleted");
        Ok(())
    }
}
