//! Rutas HTTP
//!
//! Router principal de la API: health check, disparo manual de la ingesta y
//! consultas de vehículos y lecturas.

pub mod ingestion_routes;
pub mod reading_routes;
pub mod vehicle_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::cors_middleware;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_middleware(&state.config.cors_origins);
    let timeout = TimeoutLayer::new(state.config.request_timeout());

    Router::new()
        .route("/health", get(health))
        .nest("/api/ingestion", ingestion_routes::create_ingestion_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/api/readings", reading_routes::create_reading_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(timeout)
                .layer(cors),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
