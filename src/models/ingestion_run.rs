//! Resultado de un ciclo de ingesta y su registro de auditoría

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Success,
    Error,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Success => "success",
            IngestionStatus::Error => "error",
        }
    }
}

/// Lo que devuelve el pipeline al terminar un ciclo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionOutcome {
    pub status: IngestionStatus,
    /// Lecturas creadas en este ciclo, incluso si el ciclo terminó con error
    pub processed: Vec<Uuid>,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IngestionOutcome {
    pub fn success(processed: Vec<Uuid>, skipped: usize) -> Self {
        Self {
            status: IngestionStatus::Success,
            processed,
            skipped,
            message: None,
        }
    }

    pub fn failure(processed: Vec<Uuid>, skipped: usize, message: String) -> Self {
        Self {
            status: IngestionStatus::Error,
            processed,
            skipped,
            message: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == IngestionStatus::Success
    }
}

/// Fila de `ingestion_runs`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IngestionRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: String,
    pub processed: i32,
    pub skipped: i32,
    pub message: Option<String>,
}

impl IngestionRun {
    pub fn from_outcome(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcome: &IngestionOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            finished_at,
            status: outcome.status.as_str().to_string(),
            processed: i32::try_from(outcome.processed.len()).unwrap_or(i32::MAX),
            skipped: i32::try_from(outcome.skipped).unwrap_or(i32::MAX),
            message: outcome.message.clone(),
        }
    }
}
