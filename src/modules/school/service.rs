use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use scolaris_core::AppError;
use scolaris_models::schools::{School, SchoolView, UpdateSchoolDto};

pub(crate) const SCHOOL_COLUMNS: &str = "id, name, address, phone, email, status, subscription_end_date, is_paused, paused_remaining_ms, created_at, updated_at";

pub struct SchoolService;

impl SchoolService {
    #[instrument(skip(db), fields(school.id = %school_id, db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_school(db: &PgPool, school_id: Uuid) -> Result<School, AppError> {
        sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
        ))
        .bind(school_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching school");
            AppError::from(e)
        })?
        .ok_or_else(|| {
            debug!("School not found");
            AppError::not_found(anyhow::anyhow!("School not found"))
        })
    }

    pub async fn get_school_view(db: &PgPool, school_id: Uuid) -> Result<SchoolView, AppError> {
        let school = Self::get_school(db, school_id).await?;
        Ok(school.view(Utc::now()))
    }

    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn update_school(
        db: &PgPool,
        school_id: Uuid,
        dto: UpdateSchoolDto,
    ) -> Result<SchoolView, AppError> {
        let school = sqlx::query_as::<_, School>(&format!(
            r#"
            UPDATE schools SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SCHOOL_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.email)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!("Attempted to rename school to an existing name");
                return AppError::conflict(anyhow::anyhow!("School name already exists"));
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))?;

        info!(school.name = %school.name, "School updated");

        Ok(school.view(Utc::now()))
    }
}
