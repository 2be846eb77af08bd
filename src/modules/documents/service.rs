use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use scolaris_core::file_storage::{FileStorage, object_key};
use scolaris_core::{AppError, PaginationMeta, PaginationParams};
use scolaris_models::documents::{
    Document, DocumentFilterParams, NewDocument, PaginatedDocumentsResponse,
};

use crate::metrics;

const DOCUMENT_COLUMNS: &str = "id, school_id, student_id, title, file_url, storage_key, content_type, size_bytes, uploaded_by, created_at";

/// Keeps the status axum assigns, so an oversized body stays a 413.
pub(crate) fn multipart_error(e: MultipartError) -> AppError {
    AppError::new(e.status(), e)
}

pub struct DocumentService;

impl DocumentService {
    /// Collects the `file`, `title` and optional `student_id` parts.
    pub async fn read_upload(mut multipart: Multipart) -> Result<NewDocument, AppError> {
        let mut title = None;
        let mut student_id = None;
        let mut file = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().unwrap_or("document").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    file = Some((file_name, content_type, bytes.to_vec()));
                }
                "title" => {
                    title = Some(field.text().await.map_err(multipart_error)?);
                }
                "student_id" => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    let raw = raw.trim();
                    if !raw.is_empty() {
                        student_id = Some(Uuid::parse_str(raw).map_err(|_| {
                            AppError::bad_request(anyhow::anyhow!("student_id must be a UUID"))
                        })?);
                    }
                }
                _ => {}
            }
        }

        let (file_name, content_type, bytes) =
            file.ok_or_else(|| AppError::bad_request(anyhow::anyhow!("file is required")))?;
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("title is required")))?;

        Ok(NewDocument {
            title,
            student_id,
            file_name,
            content_type,
            bytes,
        })
    }

    #[instrument(skip(db, storage, upload), fields(school.id = %school_id, document.size = upload.bytes.len(), db.operation = "INSERT", db.table = "documents"))]
    pub async fn upload_document(
        db: &PgPool,
        storage: &dyn FileStorage,
        school_id: Uuid,
        uploaded_by: Uuid,
        upload: NewDocument,
    ) -> Result<Document, AppError> {
        storage.validate_content_type(&upload.content_type)?;

        if let Some(student_id) = upload.student_id {
            let in_school = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM students WHERE id = $1 AND school_id = $2)",
            )
            .bind(student_id)
            .bind(school_id)
            .fetch_one(db)
            .await?;
            if !in_school {
                return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
            }
        }

        let key = object_key(&format!("documents/{school_id}"), &upload.file_name);
        storage.save(&key, &upload.bytes).await?;
        let file_url = storage.get_url(&key)?;

        let inserted = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents
                (school_id, student_id, title, file_url, storage_key, content_type, size_bytes, uploaded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(upload.student_id)
        .bind(&upload.title)
        .bind(&file_url)
        .bind(&key)
        .bind(&upload.content_type)
        .bind(upload.bytes.len() as i64)
        .bind(uploaded_by)
        .fetch_one(db)
        .await;

        let document = match inserted {
            Ok(document) => document,
            Err(e) => {
                Self::remove_files(storage, std::slice::from_ref(&key)).await;
                return Err(e.into());
            }
        };

        metrics::track_upload("document", upload.bytes.len());
        info!(document.id = %document.id, "Document uploaded");
        Ok(document)
    }

    #[instrument(skip(db, filters), fields(school.id = %school_id, db.operation = "SELECT", db.table = "documents"))]
    pub async fn list_documents(
        db: &PgPool,
        school_id: Uuid,
        filters: DocumentFilterParams,
    ) -> Result<PaginatedDocumentsResponse, AppError> {
        let where_clause = r#"
            WHERE school_id = $1
              AND ($2::uuid IS NULL OR student_id = $2)
              AND (NOT $3 OR student_id IS NULL)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM documents {where_clause}"
        ))
        .bind(school_id)
        .bind(filters.student_id)
        .bind(filters.school_wide)
        .fetch_one(db)
        .await?;

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents {where_clause} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(school_id)
        .bind(filters.student_id)
        .bind(filters.school_wide)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedDocumentsResponse {
            data: documents,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// What a parent sees for one child: the child's own documents and the
    /// school-wide ones.
    #[instrument(skip(db, pagination), fields(student.id = %student_id, db.operation = "SELECT", db.table = "documents"))]
    pub async fn list_for_child(
        db: &PgPool,
        school_id: Uuid,
        student_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedDocumentsResponse, AppError> {
        let where_clause = "WHERE school_id = $1 AND (student_id = $2 OR student_id IS NULL)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM documents {where_clause}"
        ))
        .bind(school_id)
        .bind(student_id)
        .fetch_one(db)
        .await?;

        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents {where_clause} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(school_id)
        .bind(student_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedDocumentsResponse {
            data: documents,
            meta: PaginationMeta::new(total, &pagination),
        })
    }

    #[instrument(skip(db, storage), fields(document.id = %document_id, db.operation = "DELETE", db.table = "documents"))]
    pub async fn delete_document(
        db: &PgPool,
        storage: &dyn FileStorage,
        school_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), AppError> {
        let storage_key = sqlx::query_scalar::<_, String>(
            "DELETE FROM documents WHERE id = $1 AND school_id = $2 RETURNING storage_key",
        )
        .bind(document_id)
        .bind(school_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Document not found")))?;

        Self::remove_files(storage, std::slice::from_ref(&storage_key)).await;

        info!("Document deleted");
        Ok(())
    }

    /// Deletes stored files after their rows are gone. Failures leave an
    /// orphan file and are only logged.
    pub async fn remove_files(storage: &dyn FileStorage, keys: &[String]) {
        for key in keys {
            if let Err(e) = storage.delete(key).await {
                warn!(error = %e, storage.key = %key, "Failed to remove stored file");
            }
        }
    }
}
