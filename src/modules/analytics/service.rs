use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use scolaris_config::AnalyticsConfig;
use scolaris_core::AppError;
use scolaris_models::students::round2;

use super::model::{
    PerformanceGroup, PerformanceGroupBy, PerformanceQueryParams, PerformanceResponse,
    RiskQueryParams, RiskResponse, RiskThresholds, StudentRiskRow, rank_at_risk,
};

pub struct AnalyticsService;

impl AnalyticsService {
    /// Students below the average threshold or above the absence threshold.
    /// Recomputed from grades and attendance on every call.
    #[instrument(skip(db, config, params), fields(school.id = %school_id, db.operation = "SELECT", db.table = "students"))]
    pub async fn at_risk_students(
        db: &PgPool,
        config: &AnalyticsConfig,
        school_id: Uuid,
        params: RiskQueryParams,
    ) -> Result<RiskResponse, AppError> {
        let rows = sqlx::query_as::<_, StudentRiskRow>(
            r#"
            SELECT s.id AS student_id, s.first_name, s.last_name, s.nsi,
                s.class_id, c.name AS class_name,
                (SELECT AVG(g.value)::float8 FROM grades g
                 WHERE g.student_id = s.id AND ($3::text IS NULL OR g.period = $3)) AS average,
                (SELECT COUNT(*) FROM attendance a
                 WHERE a.student_id = s.id AND a.status = 'absent') AS absences
            FROM students s
            JOIN classes c ON c.id = s.class_id
            WHERE s.school_id = $1 AND ($2::uuid IS NULL OR s.class_id = $2)
            "#,
        )
        .bind(school_id)
        .bind(params.class_id)
        .bind(&params.period)
        .fetch_all(db)
        .await?;

        let thresholds = RiskThresholds {
            average: config.risk_average_threshold,
            absences: config.risk_absence_threshold,
        };
        let scanned = rows.len();
        let students = rank_at_risk(rows, &thresholds);
        debug!(scanned, flagged = students.len(), "Risk scan complete");

        Ok(RiskResponse {
            thresholds,
            students,
        })
    }

    /// Grade averages per class or per subject, best first.
    #[instrument(skip(db, params), fields(school.id = %school_id, group_by = ?params.group_by, db.operation = "SELECT", db.table = "grades"))]
    pub async fn performance(
        db: &PgPool,
        school_id: Uuid,
        params: PerformanceQueryParams,
    ) -> Result<PerformanceResponse, AppError> {
        let (group_columns, group_join) = match params.group_by {
            PerformanceGroupBy::Class => (
                "c.id AS group_id, c.name AS group_name",
                "JOIN classes c ON c.id = s.class_id",
            ),
            PerformanceGroupBy::Subject => (
                "sub.id AS group_id, sub.name AS group_name",
                "JOIN subjects sub ON sub.id = g.subject_id",
            ),
        };

        let mut groups = sqlx::query_as::<_, PerformanceGroup>(&format!(
            r#"
            SELECT {group_columns},
                AVG(g.value)::float8 AS average,
                COUNT(g.id) AS grade_count,
                COUNT(DISTINCT g.student_id) AS student_count
            FROM grades g
            JOIN students s ON s.id = g.student_id
            {group_join}
            WHERE s.school_id = $1 AND ($2::text IS NULL OR g.period = $2)
            GROUP BY 1, 2
            ORDER BY average DESC, group_name
            "#
        ))
        .bind(school_id)
        .bind(&params.period)
        .fetch_all(db)
        .await?;

        for group in &mut groups {
            group.average = round2(group.average);
        }

        Ok(PerformanceResponse {
            group_by: params.group_by,
            period: params.period,
            groups,
        })
    }
}
