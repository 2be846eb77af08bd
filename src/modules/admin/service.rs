use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use scolaris_cache::{RedisCache, keys::invalidate};
use scolaris_core::file_storage::FileStorage;
use scolaris_core::{AppError, PaginationMeta};
use scolaris_models::schools::{
    AdminUpdateSchoolDto, PaginatedSchoolsResponse, PlatformStats, School, SchoolAdminInfo,
    SchoolCounts, SchoolDetail, SchoolFilterParams, SchoolStateCounts, SchoolStatus, SchoolView,
};
use scolaris_models::subscription::{Subscription, SubscriptionError, SubscriptionState};

use crate::metrics::track_subscription_transition;
use crate::modules::documents::service::DocumentService;
use crate::modules::school::service::{SCHOOL_COLUMNS, SchoolService};

/// Effective subscription state computed in SQL against the time bound to
/// `$2`. Mirrors [`Subscription::state`]: suspension wins over a pause, which
/// wins over the timer.
const STATE_EXPR: &str = r#"
    CASE
        WHEN status = 'suspended' THEN 'suspended'
        WHEN is_paused THEN 'paused'
        WHEN subscription_end_date IS NULL OR subscription_end_date > $2 THEN 'active'
        ELSE 'expired'
    END
"#;

/// A move the current state forbids is a conflict; a date the calendar
/// cannot hold is bad input.
fn transition_error(e: SubscriptionError) -> AppError {
    match e {
        SubscriptionError::OutOfRange => AppError::unprocessable(e),
        _ => AppError::conflict(e),
    }
}

pub struct AdminService;

impl AdminService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn platform_stats(db: &PgPool) -> Result<PlatformStats, AppError> {
        let timers = sqlx::query_as::<_, (SchoolStatus, Option<DateTime<Utc>>, bool, Option<i64>)>(
            "SELECT status, subscription_end_date, is_paused, paused_remaining_ms FROM schools",
        )
        .fetch_all(db)
        .await
        .context("Failed to load school subscriptions")
        .map_err(AppError::database)?;

        let now = Utc::now();
        let mut schools_by_state = SchoolStateCounts::default();
        for (status, end_date, is_paused, paused_remaining_ms) in &timers {
            let subscription = Subscription {
                status: *status,
                end_date: *end_date,
                is_paused: *is_paused,
                paused_remaining_ms: *paused_remaining_ms,
            };
            schools_by_state.record(subscription.state(now));
        }

        let (students_total, users_total, parents_total) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM students),
                (SELECT COUNT(*) FROM users WHERE school_id IS NOT NULL),
                (SELECT COUNT(*) FROM users WHERE role = 'parent')
            "#,
        )
        .fetch_one(db)
        .await
        .context("Failed to count platform totals")
        .map_err(AppError::database)?;

        Ok(PlatformStats {
            schools_total: timers.len() as i64,
            schools_by_state,
            students_total,
            users_total,
            parents_total,
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn list_schools(
        db: &PgPool,
        filters: SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let now = Utc::now();
        let search = filters.search.as_ref().map(|s| format!("%{s}%"));
        let state = filters.state.map(|s| s.as_str());
        let where_clause = format!(
            "WHERE ($1::text IS NULL OR name ILIKE $1) AND ($3::text IS NULL OR {STATE_EXPR} = $3)"
        );

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM schools {where_clause}"
        ))
        .bind(&search)
        .bind(now)
        .bind(state)
        .fetch_one(db)
        .await
        .context("Failed to count schools")
        .map_err(AppError::database)?;

        let schools = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools {where_clause} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(&search)
        .bind(now)
        .bind(state)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch schools")
        .map_err(AppError::database)?;

        Ok(PaginatedSchoolsResponse {
            data: schools.iter().map(|s| s.view(now)).collect(),
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(school.id = %school_id))]
    pub async fn get_school_detail(db: &PgPool, school_id: Uuid) -> Result<SchoolDetail, AppError> {
        let school = SchoolService::get_school(db, school_id).await?;

        let counts = sqlx::query_as::<_, SchoolCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM students WHERE school_id = $1) AS student_count,
                (SELECT COUNT(*) FROM classes WHERE school_id = $1) AS class_count,
                (SELECT COUNT(*) FROM users WHERE school_id = $1) AS user_count
            "#,
        )
        .bind(school_id)
        .fetch_one(db)
        .await?;

        let admins = sqlx::query_as::<_, SchoolAdminInfo>(
            "SELECT id, first_name, last_name, email FROM users WHERE school_id = $1 AND role = 'admin' ORDER BY created_at",
        )
        .bind(school_id)
        .fetch_all(db)
        .await?;

        Ok(SchoolDetail {
            school: school.view(Utc::now()),
            counts,
            admins,
        })
    }

    /// Updates the school's details and, when given, the login email of its
    /// first admin. Both writes commit together or not at all.
    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn update_school(
        db: &PgPool,
        school_id: Uuid,
        dto: AdminUpdateSchoolDto,
    ) -> Result<SchoolView, AppError> {
        let mut tx = db.begin().await?;

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
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!("School name already exists"));
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))?;

        if let Some(admin_email) = &dto.admin_email {
            let admin_email = admin_email.trim().to_lowercase();
            let updated = sqlx::query(
                r#"
                UPDATE users SET email = $2, updated_at = NOW()
                WHERE id = (
                    SELECT id FROM users
                    WHERE school_id = $1 AND role = 'admin'
                    ORDER BY created_at
                    LIMIT 1
                )
                "#,
            )
            .bind(school_id)
            .bind(&admin_email)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_unique_violation()
                {
                    warn!("Admin email already taken, rolling back school update");
                    return AppError::conflict(anyhow::anyhow!("Email already registered"));
                }
                AppError::from(e)
            })?;

            if updated.rows_affected() == 0 {
                return Err(AppError::not_found(anyhow::anyhow!(
                    "School has no admin account"
                )));
            }
        }

        tx.commit().await?;

        info!(school.name = %school.name, "School updated by superadmin");
        Ok(school.view(Utc::now()))
    }

    /// Deletes the school and everything attached to it, then its stored files.
    #[instrument(skip(db, cache, storage), fields(school.id = %school_id, db.operation = "DELETE", db.table = "schools"))]
    pub async fn delete_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        storage: &dyn FileStorage,
        school_id: Uuid,
    ) -> Result<(), AppError> {
        let storage_keys =
            sqlx::query_scalar::<_, String>("SELECT storage_key FROM documents WHERE school_id = $1")
                .bind(school_id)
                .fetch_all(db)
                .await?;
        let nsis = sqlx::query_scalar::<_, String>("SELECT nsi FROM students WHERE school_id = $1")
            .bind(school_id)
            .fetch_all(db)
            .await?;

        let result = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(school_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("School not found")));
        }

        DocumentService::remove_files(storage, &storage_keys).await;
        for nsi in &nsis {
            invalidate::public_result(cache, nsi).await;
        }

        info!(
            students = nsis.len(),
            documents = storage_keys.len(),
            "School deleted"
        );
        Ok(())
    }

    /// Locks the school row, applies `apply` to its subscription and writes
    /// the timer columns back.
    async fn transition<F>(
        db: &PgPool,
        school_id: Uuid,
        action: &'static str,
        apply: F,
    ) -> Result<SchoolView, AppError>
    where
        F: FnOnce(&mut Subscription, DateTime<Utc>) -> Result<(), SubscriptionError>,
    {
        let mut tx = db.begin().await?;

        let school = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1 FOR UPDATE"
        ))
        .bind(school_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))?;

        let now = Utc::now();
        let mut subscription = school.subscription();
        apply(&mut subscription, now).map_err(|e| {
            warn!(school.id = %school_id, action, error = %e, "Subscription transition refused");
            transition_error(e)
        })?;

        let school = sqlx::query_as::<_, School>(&format!(
            r#"
            UPDATE schools SET
                status = $2,
                subscription_end_date = $3,
                is_paused = $4,
                paused_remaining_ms = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SCHOOL_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(subscription.status)
        .bind(subscription.end_date)
        .bind(subscription.is_paused)
        .bind(subscription.paused_remaining_ms)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        track_subscription_transition(action);
        info!(
            school.id = %school_id,
            action,
            state = school.subscription().state(now).as_str(),
            "Subscription updated"
        );
        Ok(school.view(now))
    }

    pub async fn suspend(db: &PgPool, school_id: Uuid) -> Result<SchoolView, AppError> {
        Self::transition(db, school_id, "suspend", |sub, _| sub.suspend()).await
    }

    pub async fn activate(db: &PgPool, school_id: Uuid) -> Result<SchoolView, AppError> {
        Self::transition(db, school_id, "activate", |sub, _| sub.activate()).await
    }

    pub async fn pause(db: &PgPool, school_id: Uuid) -> Result<SchoolView, AppError> {
        Self::transition(db, school_id, "pause", |sub, now| sub.pause(now)).await
    }

    pub async fn resume(db: &PgPool, school_id: Uuid) -> Result<SchoolView, AppError> {
        Self::transition(db, school_id, "resume", |sub, now| sub.resume(now)).await
    }

    pub async fn extend(db: &PgPool, school_id: Uuid, days: i64) -> Result<SchoolView, AppError> {
        Self::transition(db, school_id, "extend", |sub, now| sub.extend(days, now)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_state_expression_covers_every_state() {
        for state in SubscriptionState::ALL {
            assert!(STATE_EXPR.contains(&format!("'{}'", state.as_str())));
        }
    }

    #[test]
    fn test_refused_transition_is_a_conflict() {
        let err = transition_error(SubscriptionError::AlreadyPaused);
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_out_of_range_transition_is_unprocessable() {
        let err = transition_error(SubscriptionError::OutOfRange);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
