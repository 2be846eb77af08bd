//! Risk sentinel and performance leaderboard types.
//!
//! The SQL aggregates; [`classify_risk`] and [`rank_at_risk`] decide who is
//! flagged and in what order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use scolaris_core::serde::{deserialize_optional_trimmed, deserialize_optional_uuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskReason {
    LowAverage,
    ExcessiveAbsences,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RiskThresholds {
    /// Averages strictly below this are flagged
    pub average: f64,
    /// Absence counts strictly above this are flagged
    pub absences: i64,
}

/// A student without grades is never flagged for a low average.
pub fn classify_risk(average: Option<f64>, absences: i64, thresholds: &RiskThresholds) -> Vec<RiskReason> {
    let mut reasons = Vec::with_capacity(2);
    if average.is_some_and(|avg| avg < thresholds.average) {
        reasons.push(RiskReason::LowAverage);
    }
    if absences > thresholds.absences {
        reasons.push(RiskReason::ExcessiveAbsences);
    }
    reasons
}

/// One aggregated row per student.
#[derive(Debug, Clone, FromRow)]
pub struct StudentRiskRow {
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub nsi: String,
    pub class_id: Uuid,
    pub class_name: String,
    pub average: Option<f64>,
    pub absences: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RiskEntry {
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub nsi: String,
    pub class_id: Uuid,
    pub class_name: String,
    pub average: Option<f64>,
    pub absences: i64,
    pub reasons: Vec<RiskReason>,
}

/// Keeps flagged students, most absent first, then weakest average first.
/// Students without an average sort after those with one.
pub fn rank_at_risk(rows: Vec<StudentRiskRow>, thresholds: &RiskThresholds) -> Vec<RiskEntry> {
    let mut entries: Vec<RiskEntry> = rows
        .into_iter()
        .filter_map(|row| {
            let reasons = classify_risk(row.average, row.absences, thresholds);
            if reasons.is_empty() {
                return None;
            }
            Some(RiskEntry {
                student_id: row.student_id,
                first_name: row.first_name,
                last_name: row.last_name,
                nsi: row.nsi,
                class_id: row.class_id,
                class_name: row.class_name,
                average: row.average.map(crate::students::round2),
                absences: row.absences,
                reasons,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.absences
            .cmp(&a.absences)
            .then_with(|| match (a.average, b.average) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
    entries
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RiskQueryParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    /// Only grades from this period count toward the average
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub period: Option<String>,
    /// Superadmin only: the school to analyse
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RiskResponse {
    pub thresholds: RiskThresholds,
    pub students: Vec<RiskEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceGroupBy {
    #[default]
    Class,
    Subject,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PerformanceQueryParams {
    #[serde(default)]
    pub group_by: PerformanceGroupBy,
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub period: Option<String>,
    /// Superadmin only: the school to analyse
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PerformanceGroup {
    pub group_id: Uuid,
    pub group_name: String,
    pub average: f64,
    pub grade_count: i64,
    pub student_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PerformanceResponse {
    pub group_by: PerformanceGroupBy,
    pub period: Option<String>,
    pub groups: Vec<PerformanceGroup>,
}
