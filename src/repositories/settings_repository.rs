use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::TrackingSettings;
use crate::utils::errors::AppResult;

/// Lectura de la configuración de la integración
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> AppResult<Option<TrackingSettings>>;
}

pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn load(&self) -> AppResult<Option<TrackingSettings>> {
        let settings = sqlx::query_as::<_, TrackingSettings>(
            "SELECT base_url, provider_name, token, frequency_minutes FROM tracking_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }
}
