use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::IngestionRun;
use crate::utils::errors::AppResult;

/// Registro de auditoría de ciclos de ingesta
#[async_trait]
pub trait RunLogStore: Send + Sync {
    async fn record(&self, run: &IngestionRun) -> AppResult<()>;
    /// Ciclos más recientes primero
    async fn recent(&self, limit: i64) -> AppResult<Vec<IngestionRun>>;
}

pub struct RunLogRepository {
    pool: PgPool,
}

impl RunLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunLogStore for RunLogRepository {
    async fn record(&self, run: &IngestionRun) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ingestion_runs (id, started_at, finished_at, status, processed, skipped, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(run.id)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(&run.status)
        .bind(run.processed)
        .bind(run.skipped)
        .bind(&run.message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<IngestionRun>> {
        let runs = sqlx::query_as::<_, IngestionRun>(
            "SELECT * FROM ingestion_runs ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(runs)
    }
}
