//! Cliente HTTP del proveedor de telemetría
//!
//! Una sola petición GET por ciclo. El token viaja como query parameter y
//! nunca se escribe en los logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::models::TrackingSettings;
use crate::utils::errors::IngestionError;

/// Entrada cruda tal como la entrega el proveedor
pub type TelemetryEntry = Value;

/// Fuente de entradas de telemetría
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch(
        &self,
        settings: &TrackingSettings,
    ) -> Result<Vec<TelemetryEntry>, IngestionError>;
}

pub struct TelemetryHttpClient {
    client: Client,
}

impl TelemetryHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vehicle_tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TelemetrySource for TelemetryHttpClient {
    async fn fetch(
        &self,
        settings: &TrackingSettings,
    ) -> Result<Vec<TelemetryEntry>, IngestionError> {
        info!(
            "📡 Consultando telemetría del proveedor {}",
            settings.provider_name
        );

        let response = self
            .client
            .get(&settings.base_url)
            .query(&[
                ("providerName", settings.provider_name.as_str()),
                ("fcode", settings.token.as_str()),
            ])
            .send()
            .await
            // Sin URL: la query lleva el token
            .map_err(|e| IngestionError::TransportFailure(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IngestionError::TransportFailure(e.without_url().to_string()))?;

        debug!("📥 Respuesta {} ({} bytes)", status, body.len());
        parse_telemetry_body(status, &body)
    }
}

/// Clasificar la respuesta del proveedor: sólo un 2xx con un array JSON es válido
pub fn parse_telemetry_body(
    status: StatusCode,
    body: &str,
) -> Result<Vec<TelemetryEntry>, IngestionError> {
    if !status.is_success() {
        return Err(IngestionError::RemoteStatusError {
            status: status.as_u16(),
        });
    }

    if body.trim().is_empty() {
        return Err(IngestionError::MalformedResponse(
            "empty response body".to_string(),
        ));
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| IngestionError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    match parsed {
        Value::Array(entries) => Ok(entries),
        other => Err(IngestionError::MalformedResponse(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_settings;
    use axum::{extract::Query, routing::get, Router};
    use rstest::rstest;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type SeenQuery = Arc<Mutex<Option<HashMap<String, String>>>>;

    /// Proveedor falso en un puerto efímero que guarda la query recibida
    async fn serve_provider(body: &'static str) -> (String, SeenQuery) {
        let seen: SeenQuery = Arc::new(Mutex::new(None));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/api/vehicles",
            get(move |Query(query): Query<HashMap<String, String>>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(query);
                    body
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/api/vehicles", addr), seen)
    }

    #[tokio::test]
    async fn test_fetch_sends_provider_and_token_as_query() {
        let (base_url, seen) =
            serve_provider(r#"[{"vehicleNo":"DXB-1"},{"vehicleNo":"DXB-2"}]"#).await;
        let settings = TrackingSettings {
            base_url,
            ..sample_settings()
        };
        let client = TelemetryHttpClient::new(Duration::from_secs(5)).unwrap();

        let entries = client.fetch(&settings).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["vehicleNo"], "DXB-2");
        let query = seen.lock().unwrap().clone().unwrap();
        assert_eq!(query.get("providerName").map(String::as_str), Some("erpgulf"));
        assert_eq!(query.get("fcode").map(String::as_str), Some("secret-token"));
    }

    #[tokio::test]
    async fn test_fetch_from_closed_port_hides_the_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let settings = TrackingSettings {
            base_url: format!("http://{}/api/vehicles", addr),
            ..sample_settings()
        };
        let client = TelemetryHttpClient::new(Duration::from_secs(5)).unwrap();

        match client.fetch(&settings).await {
            Err(IngestionError::TransportFailure(message)) => {
                assert!(!message.contains("secret-token"));
                assert!(!message.contains("fcode"));
            }
            other => panic!("unexpected fetch result: {:?}", other),
        }
    }

    #[test]
    fn test_array_body_is_accepted() {
        let entries = parse_telemetry_body(
            StatusCode::OK,
            r#"[{"vehicleNo":"DXB-1"},{"vehicleNo":"DXB-2"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);

        let empty = parse_telemetry_body(StatusCode::OK, "[]").unwrap();
        assert!(empty.is_empty());
    }

    #[rstest]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, 500)]
    #[case(StatusCode::UNAUTHORIZED, 401)]
    #[case(StatusCode::NOT_FOUND, 404)]
    fn test_non_success_status(#[case] status: StatusCode, #[case] code: u16) {
        let err = parse_telemetry_body(status, "[]").unwrap_err();
        assert_eq!(err, IngestionError::RemoteStatusError { status: code });
    }

    #[rstest]
    #[case("")]
    #[case("   \n")]
    #[case("<html>oops</html>")]
    #[case(r#"{"vehicleNo":"DXB-1"}"#)]
    #[case("null")]
    #[case("\"[]\"")]
    fn test_malformed_bodies(#[case] body: &str) {
        let err = parse_telemetry_body(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, IngestionError::MalformedResponse(_)));
    }

    #[test]
    fn test_object_body_message() {
        let err = parse_telemetry_body(StatusCode::OK, "{}").unwrap_err();
        assert_eq!(
            err,
            IngestionError::MalformedResponse("expected a JSON array, got an object".to_string())
        );
    }
}
