use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use scolaris_core::serde::deserialize_optional_uuid;
use scolaris_core::{PaginationMeta, PaginationParams};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub school_id: Uuid,
    /// `None` for school-wide documents
    pub student_id: Option<Uuid>,
    pub title: String,
    pub file_url: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Multipart body of `POST /api/documents`, for the OpenAPI schema.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub title: String,
    pub student_id: Option<Uuid>,
}

/// Validated fields of an upload, ready for storage.
#[derive(Debug)]
pub struct NewDocument {
    pub title: String,
    pub student_id: Option<Uuid>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    /// Only school-wide documents
    #[serde(default)]
    pub school_wide: bool,
    /// Superadmin only: the school to list
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedDocumentsResponse {
    pub data: Vec<Document>,
    pub meta: PaginationMeta,
}
