use axum::extract::Multipart;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use scolaris_core::AppError;
use scolaris_core::file_storage::{FileStorage, object_key};

use crate::metrics;
use crate::modules::documents::service::{DocumentService, multipart_error};

use super::model::{Audience, MediaUpload, NewNotification, Notification, parse_form_flag};

const NOTIFICATION_COLUMNS: &str = "id, title, message, media_url, media_type, storage_key, show_on_login, show_on_admin, show_on_parent, created_by, created_at";

/// Most recent notifications returned to a dashboard.
const FEED_LIMIT: i64 = 50;

pub struct NotificationService;

impl NotificationService {
    /// Text fields and flags of the form, plus the `media` file if sent.
    /// An absent `show_on_admin` defaults to shown.
    pub async fn read_form(
        mut multipart: Multipart,
    ) -> Result<(NewNotification, Option<MediaUpload>), AppError> {
        let mut notification = NewNotification {
            show_on_admin: true,
            ..NewNotification::default()
        };
        let mut media = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "media" => {
                    let file_name = field.file_name().unwrap_or("media").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !bytes.is_empty() {
                        media = Some(MediaUpload {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                "title" => {
                    let text = field.text().await.map_err(multipart_error)?;
                    notification.title = text.trim().to_string();
                }
                "message" => {
                    let text = field.text().await.map_err(multipart_error)?;
                    notification.message = text.trim().to_string();
                }
                "show_on_login" | "show_on_admin" | "show_on_parent" => {
                    let set = parse_form_flag(&field.text().await.map_err(multipart_error)?);
                    match name.as_str() {
                        "show_on_login" => notification.show_on_login = set,
                        "show_on_admin" => notification.show_on_admin = set,
                        _ => notification.show_on_parent = set,
                    }
                }
                _ => {}
            }
        }

        notification.validate()?;
        Ok((notification, media))
    }

    #[instrument(skip(db, storage, notification, media), fields(db.operation = "INSERT", db.table = "notifications"))]
    pub async fn create_notification(
        db: &PgPool,
        storage: &dyn FileStorage,
        created_by: Uuid,
        notification: NewNotification,
        media: Option<MediaUpload>,
    ) -> Result<Notification, AppError> {
        let mut storage_key = None;
        let mut media_url = None;
        if let Some(upload) = &media {
            storage.validate_content_type(&upload.content_type)?;
            let key = object_key("notifications", &upload.file_name);
            storage.save(&key, &upload.bytes).await?;
            media_url = Some(storage.get_url(&key)?);
            storage_key = Some(key);
        }
        let media_type = media.as_ref().map(|upload| upload.content_type.clone());

        let inserted = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
                (title, message, media_url, media_type, storage_key,
                 show_on_login, show_on_admin, show_on_parent, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&media_url)
        .bind(&media_type)
        .bind(&storage_key)
        .bind(notification.show_on_login)
        .bind(notification.show_on_admin)
        .bind(notification.show_on_parent)
        .bind(created_by)
        .fetch_one(db)
        .await;

        let created = match inserted {
            Ok(created) => created,
            Err(e) => {
                if let Some(key) = storage_key {
                    DocumentService::remove_files(storage, &[key]).await;
                }
                return Err(e.into());
            }
        };

        if let Some(upload) = &media {
            metrics::track_upload("notification_media", upload.bytes.len());
        }
        info!(notification.id = %created.id, "Notification published");
        Ok(created)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "notifications"))]
    pub async fn list_for(db: &PgPool, audience: Audience) -> Result<Vec<Notification>, AppError> {
        let filter = audience
            .flag_column()
            .map(|column| format!("WHERE {column}"))
            .unwrap_or_default();

        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications {filter} ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(FEED_LIMIT)
        .fetch_all(db)
        .await?;

        Ok(notifications)
    }

    #[instrument(skip(db, storage), fields(notification.id = %notification_id, db.operation = "DELETE", db.table = "notifications"))]
    pub async fn delete_notification(
        db: &PgPool,
        storage: &dyn FileStorage,
        notification_id: Uuid,
    ) -> Result<(), AppError> {
        let storage_key = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM notifications WHERE id = $1 RETURNING storage_key",
        )
        .bind(notification_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notification not found")))?;

        if let Some(key) = storage_key {
            DocumentService::remove_files(storage, &[key]).await;
        }

        info!("Notification deleted");
        Ok(())
    }
}
