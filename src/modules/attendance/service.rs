use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use scolaris_core::{AppError, PaginationMeta};
use scolaris_models::attendance::{
    Attendance, AttendanceFilterParams, AttendanceWithStudent, CreateAttendanceDto,
    PaginatedAttendanceResponse, UpdateAttendanceDto,
};

const ATTENDANCE_COLUMNS: &str =
    "id, student_id, date, status, reason, parent_notified, created_at, updated_at";

const IN_SCHOOL: &str = "student_id IN (SELECT id FROM students WHERE school_id = $2)";

pub struct AttendanceService;

impl AttendanceService {
    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "INSERT", db.table = "attendance"))]
    pub async fn create_attendance(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateAttendanceDto,
    ) -> Result<Attendance, AppError> {
        let record = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            INSERT INTO attendance (student_id, date, status, reason)
            SELECT s.id, $3, $4, $5 FROM students s WHERE s.id = $1 AND s.school_id = $2
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(dto.student_id)
        .bind(school_id)
        .bind(dto.date)
        .bind(dto.status)
        .bind(&dto.reason)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!(date = %dto.date, "Attendance already recorded for this day");
                return AppError::conflict(anyhow::anyhow!(
                    "Attendance already recorded for this student on this date"
                ));
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        info!(attendance.id = %record.id, status = ?record.status, "Attendance recorded");
        Ok(record)
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "attendance"))]
    pub async fn list_attendance(
        db: &PgPool,
        school_id: Uuid,
        filters: AttendanceFilterParams,
    ) -> Result<PaginatedAttendanceResponse, AppError> {
        let where_clause = r#"
            WHERE s.school_id = $1
              AND ($2::uuid IS NULL OR a.student_id = $2)
              AND ($3::uuid IS NULL OR s.class_id = $3)
              AND ($4::attendance_status IS NULL OR a.status = $4)
              AND ($5::date IS NULL OR a.date >= $5)
              AND ($6::date IS NULL OR a.date <= $6)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM attendance a JOIN students s ON s.id = a.student_id {where_clause}"
        ))
        .bind(school_id)
        .bind(filters.student_id)
        .bind(filters.class_id)
        .bind(filters.status)
        .bind(filters.from)
        .bind(filters.to)
        .fetch_one(db)
        .await?;

        let records = sqlx::query_as::<_, AttendanceWithStudent>(&format!(
            r#"
            SELECT a.id, a.student_id, a.date, a.status, a.reason, a.parent_notified,
                a.created_at, a.updated_at,
                s.first_name AS student_first_name,
                s.last_name AS student_last_name
            FROM attendance a
            JOIN students s ON s.id = a.student_id
            {where_clause}
            ORDER BY a.date DESC, s.last_name
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(school_id)
        .bind(filters.student_id)
        .bind(filters.class_id)
        .bind(filters.status)
        .bind(filters.from)
        .bind(filters.to)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedAttendanceResponse {
            data: records,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, dto), fields(attendance.id = %attendance_id, db.operation = "UPDATE", db.table = "attendance"))]
    pub async fn update_attendance(
        db: &PgPool,
        school_id: Uuid,
        attendance_id: Uuid,
        dto: UpdateAttendanceDto,
    ) -> Result<Attendance, AppError> {
        sqlx::query_as::<_, Attendance>(&format!(
            r#"
            UPDATE attendance SET
                status = COALESCE($3, status),
                reason = COALESCE($4, reason),
                updated_at = NOW()
            WHERE id = $1 AND {IN_SCHOOL}
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(attendance_id)
        .bind(school_id)
        .bind(dto.status)
        .bind(&dto.reason)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Attendance record not found")))
    }

    #[instrument(skip(db), fields(attendance.id = %attendance_id, db.operation = "DELETE", db.table = "attendance"))]
    pub async fn delete_attendance(
        db: &PgPool,
        school_id: Uuid,
        attendance_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query(&format!("DELETE FROM attendance WHERE id = $1 AND {IN_SCHOOL}"))
            .bind(attendance_id)
            .bind(school_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Attendance record not found"
            )));
        }
        Ok(())
    }

    /// Flags the record as communicated to the student's parent. Repeating
    /// the call is harmless; a student without a parent is a conflict.
    #[instrument(skip(db), fields(attendance.id = %attendance_id, db.operation = "UPDATE", db.table = "attendance"))]
    pub async fn notify_parent(
        db: &PgPool,
        school_id: Uuid,
        attendance_id: Uuid,
    ) -> Result<Attendance, AppError> {
        let parent_id = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            SELECT s.parent_id FROM attendance a
            JOIN students s ON s.id = a.student_id
            WHERE a.id = $1 AND s.school_id = $2
            "#,
        )
        .bind(attendance_id)
        .bind(school_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Attendance record not found")))?;

        let Some(parent_id) = parent_id else {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Student has no linked parent to notify"
            )));
        };

        let record = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            UPDATE attendance SET
                parent_notified = TRUE,
                updated_at = CASE WHEN parent_notified THEN updated_at ELSE NOW() END
            WHERE id = $1
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        ))
        .bind(attendance_id)
        .fetch_one(db)
        .await?;

        info!(user.id = %parent_id, "Parent marked as notified");
        Ok(record)
    }
}
