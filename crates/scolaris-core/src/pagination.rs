use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Query strings arrive as text; an empty value means "not provided".
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub total: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let page = params.page();
        let total = total.max(0);
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Self {
            total,
            limit,
            page,
            total_pages,
            has_more: params.offset() + limit < total,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page size (1-100, default 20)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// 1-based page number
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<i64>, page: Option<i64>) -> PaginationParams {
        PaginationParams { limit, page }
    }

    #[test]
    fn test_defaults() {
        let p = PaginationParams::default();
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.page(), 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_is_clamped() {
        for (input, expected) in [(Some(0), 1), (Some(-3), 1), (Some(100), 100), (Some(150), 100)] {
            assert_eq!(params(input, None).limit(), expected);
        }
    }

    #[test]
    fn test_offset_from_page() {
        assert_eq!(params(Some(25), Some(3)).offset(), 50);
        assert_eq!(params(Some(10), Some(-2)).offset(), 0);
    }

    #[test]
    fn test_meta_computes_pages() {
        let meta = PaginationMeta::new(45, &params(Some(20), Some(2)));
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_more);

        let last = PaginationMeta::new(45, &params(Some(20), Some(3)));
        assert!(!last.has_more);

        let empty = PaginationMeta::new(0, &PaginationParams::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }

    #[test]
    fn test_deserialize_accepts_strings_numbers_and_blanks() {
        let p: PaginationParams = serde_json::from_str(r#"{"limit":"30","page":2}"#).unwrap();
        assert_eq!(p.limit(), 30);
        assert_eq!(p.page(), 2);

        let p: PaginationParams = serde_json::from_str(r#"{"limit":"","page":""}"#).unwrap();
        assert_eq!(p.limit(), DEFAULT_LIMIT);
        assert_eq!(p.page(), 1);

        assert!(serde_json::from_str::<PaginationParams>(r#"{"limit":"abc"}"#).is_err());
    }
}
