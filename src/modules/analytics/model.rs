pub use scolaris_models::analytics::{
    PerformanceGroup, PerformanceGroupBy, PerformanceQueryParams, PerformanceResponse,
    RiskEntry, RiskQueryParams, RiskReason, RiskResponse, RiskThresholds, StudentRiskRow,
    rank_at_risk,
};
