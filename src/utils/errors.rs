//! Sistema de manejo de errores
//!
//! Este módulo define los errores del ciclo de ingesta y los errores de la API
//! junto con su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

/// Errores de un ciclo de ingesta de telemetría
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestionError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Remote API returned HTTP {status}")]
    RemoteStatusError { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Entrada individual inválida; se omite sin abortar el ciclo
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl IngestionError {
    /// Título corto para el log del operador
    pub fn title(&self) -> &'static str {
        match self {
            IngestionError::ConfigurationMissing(_) => "Vehicle Tracker Configuration Error",
            IngestionError::TransportFailure(_) => "Vehicle Tracker Connection Error",
            IngestionError::RemoteStatusError { .. } => "Vehicle Tracker API Error",
            IngestionError::MalformedResponse(_) => "Vehicle Tracker Response Error",
            IngestionError::Validation(_) => "Vehicle Tracker Validation Error",
            IngestionError::Persistence(_) => "Vehicle Tracker Database Error",
            IngestionError::Cache(_) => "Vehicle Tracker Scheduler Error",
        }
    }
}

impl From<AppError> for IngestionError {
    fn from(err: AppError) -> Self {
        IngestionError::Persistence(err.to_string())
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                warn!("⚠️ Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                warn!("⚠️ Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingestion_error_messages() {
        let err = IngestionError::RemoteStatusError { status: 503 };
        assert_eq!(err.to_string(), "Remote API returned HTTP 503");
        assert_eq!(err.title(), "Vehicle Tracker API Error");

        let err = IngestionError::MalformedResponse("expected a JSON array".to_string());
        assert!(err.to_string().contains("expected a JSON array"));
    }

    #[test]
    fn test_app_error_status_codes() {
        let response = AppError::NotFound("vehicle".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = bad_request_error("limit must be positive").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_app_error_converts_to_persistence_error() {
        let err: IngestionError = AppError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, IngestionError::Persistence(msg) if msg.contains("pool timed out")));
    }
}
