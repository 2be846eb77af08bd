use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};

use scolaris_cache::{RedisCache, invalidate, keys};
use scolaris_core::AppError;
use scolaris_models::settings::{PlatformSettings, UpdateSettingsDto};

pub struct SettingsService;

impl SettingsService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "platform_settings"))]
    pub async fn load(db: &PgPool) -> Result<PlatformSettings, AppError> {
        let rows = sqlx::query_as::<_, (String, Value)>("SELECT key, value FROM platform_settings")
            .fetch_all(db)
            .await?;

        PlatformSettings::from_rows(rows).map_err(|e| {
            error!(error = %e, "Stored platform settings are malformed");
            AppError::internal(e)
        })
    }

    /// Read-through on the settings cache key.
    pub async fn load_cached(
        db: &PgPool,
        cache: Option<&RedisCache>,
    ) -> Result<PlatformSettings, AppError> {
        let cache_key = keys::platform_settings();

        if let Some(cache) = cache
            && let Some(settings) = cache.get::<PlatformSettings>(&cache_key).await
        {
            debug!("Platform settings served from cache");
            return Ok(settings);
        }

        let settings = Self::load(db).await?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &settings).await
        {
            warn!(error = %e, "Failed to cache platform settings");
        }

        Ok(settings)
    }

    /// Applies a partial update in one transaction and drops the cached copy.
    #[instrument(skip(db, cache, dto), fields(db.operation = "UPSERT", db.table = "platform_settings"))]
    pub async fn update(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: UpdateSettingsDto,
    ) -> Result<PlatformSettings, AppError> {
        let mut tx = db.begin().await?;

        // Serializes concurrent updates on the settings table.
        sqlx::query("LOCK TABLE platform_settings IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query_as::<_, (String, Value)>("SELECT key, value FROM platform_settings")
            .fetch_all(&mut *tx)
            .await?;
        let mut settings = PlatformSettings::from_rows(rows).map_err(AppError::internal)?;

        let changed = settings.apply(dto);
        for key in &changed {
            sqlx::query(
                r#"
                INSERT INTO platform_settings (key, value, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                "#,
            )
            .bind(key.as_str())
            .bind(settings.value_of(*key))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        if !changed.is_empty() {
            invalidate::settings(cache).await;
        }

        info!(
            changed = ?changed.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "Platform settings updated"
        );

        Ok(settings)
    }

    pub async fn trial_days(db: &PgPool) -> Result<i64, AppError> {
        Ok(Self::load(db).await?.trial_days)
    }
}
