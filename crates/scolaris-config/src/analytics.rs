use std::env;

/// Thresholds used by the risk sentinel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyticsConfig {
    /// A student averaging strictly below this is flagged.
    pub risk_average_threshold: f64,
    /// A student with strictly more absences than this is flagged.
    pub risk_absence_threshold: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            risk_average_threshold: 10.0,
            risk_absence_threshold: 3,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            risk_average_threshold: env::var("RISK_AVERAGE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &f64| v.is_finite())
                .unwrap_or(defaults.risk_average_threshold),
            risk_absence_threshold: env::var("RISK_ABSENCE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.risk_absence_threshold),
        }
    }
}
