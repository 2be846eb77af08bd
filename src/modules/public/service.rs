use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use scolaris_cache::RedisCache;
use scolaris_cache::keys::{self, PUBLIC_RESULT_TTL};
use scolaris_core::AppError;
use scolaris_models::nsi::is_valid_nsi;

use super::model::{PublicStudentResult, PublicStudentRow, SubjectAverage, round2, weighted_average};

pub struct PublicService;

impl PublicService {
    /// Result sheet for one NSI: per-subject averages and the coefficient
    /// weighted overall average. Served from the cache for a short while.
    #[instrument(skip(db, cache), fields(db.operation = "SELECT", db.table = "students"))]
    pub async fn student_result(
        db: &PgPool,
        cache: Option<&RedisCache>,
        nsi: &str,
    ) -> Result<PublicStudentResult, AppError> {
        let nsi = nsi.trim().to_ascii_uppercase();
        if !is_valid_nsi(&nsi) {
            debug!("Malformed NSI lookup");
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        let cache_key = keys::public_result(&nsi);
        if let Some(cache) = cache
            && let Some(cached) = cache.get::<PublicStudentResult>(&cache_key).await
        {
            return Ok(cached);
        }

        let student = sqlx::query_as::<_, PublicStudentRow>(
            r#"
            SELECT s.id, s.first_name, s.last_name, s.nsi,
                c.name AS class_name, sc.name AS school_name
            FROM students s
            JOIN classes c ON c.id = s.class_id
            JOIN schools sc ON sc.id = s.school_id
            WHERE s.nsi = $1
            "#,
        )
        .bind(&nsi)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        let mut subjects = sqlx::query_as::<_, SubjectAverage>(
            r#"
            SELECT sub.id AS subject_id, sub.name AS subject_name, sub.coefficient,
                AVG(g.value)::float8 AS average, COUNT(g.id) AS grade_count
            FROM grades g
            JOIN subjects sub ON sub.id = g.subject_id
            WHERE g.student_id = $1
            GROUP BY sub.id, sub.name, sub.coefficient
            ORDER BY sub.name
            "#,
        )
        .bind(student.id)
        .fetch_all(db)
        .await?;

        for subject in &mut subjects {
            subject.average = round2(subject.average);
        }

        let result = PublicStudentResult {
            overall_average: weighted_average(&subjects),
            nsi: student.nsi,
            first_name: student.first_name,
            last_name: student.last_name,
            class_name: student.class_name,
            school_name: student.school_name,
            subjects,
        };

        if let Some(cache) = cache
            && let Err(e) = cache
                .set_with_ttl(&cache_key, &result, PUBLIC_RESULT_TTL)
                .await
        {
            warn!(error = %e, "Failed to cache public result");
        }

        Ok(result)
    }
}
