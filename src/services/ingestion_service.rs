//! Pipeline de ingesta
//!
//! Un ciclo completo: cargar configuración, consultar al proveedor, y por
//! cada entrada resolver el vehículo, normalizar y persistir la lectura.
//! `run` nunca falla; todos los errores del ciclo se devuelven como un
//! `IngestionOutcome` con estado `error`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::clients::{TelemetryEntry, TelemetrySource};
use crate::models::{IngestionOutcome, IngestionRun, NewReading, TrackingSettings};
use crate::repositories::{ReadingStore, RunLogStore, SettingsStore};
use crate::services::normalization::normalize_entry;
use crate::services::registry_resolver::RegistryResolver;
use crate::utils::errors::IngestionError;

pub struct IngestionPipeline {
    settings: Arc<dyn SettingsStore>,
    source: Arc<dyn TelemetrySource>,
    resolver: RegistryResolver,
    readings: Arc<dyn ReadingStore>,
    runs: Arc<dyn RunLogStore>,
    clock: Arc<dyn Clock>,
}

/// Progreso parcial del ciclo, conservado aunque el ciclo aborte
#[derive(Default)]
struct CycleProgress {
    processed: Vec<Uuid>,
    skipped: usize,
}

impl IngestionPipeline {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        source: Arc<dyn TelemetrySource>,
        resolver: RegistryResolver,
        readings: Arc<dyn ReadingStore>,
        runs: Arc<dyn RunLogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            source,
            resolver,
            readings,
            runs,
            clock,
        }
    }

    /// Ejecutar un ciclo completo de ingesta
    pub async fn run(&self) -> IngestionOutcome {
        let started_at = self.clock.utc();
        info!("🚀 Iniciando ciclo de ingesta de telemetría");

        let mut progress = CycleProgress::default();
        let outcome = match self.execute(started_at, &mut progress).await {
            Ok(()) => {
                info!(
                    "✅ Ciclo completado: {} lecturas creadas, {} entradas omitidas",
                    progress.processed.len(),
                    progress.skipped
                );
                IngestionOutcome::success(progress.processed, progress.skipped)
            }
            Err(e) => {
                error!("❌ {}: {}", e.title(), e);
                IngestionOutcome::failure(progress.processed, progress.skipped, e.to_string())
            }
        };

        self.record(started_at, &outcome).await;
        outcome
    }

    /// Cargar y validar la configuración persistida
    pub async fn load_settings(&self) -> Result<TrackingSettings, IngestionError> {
        load_settings(self.settings.as_ref()).await
    }

    async fn execute(
        &self,
        fetched_at: DateTime<Utc>,
        progress: &mut CycleProgress,
    ) -> Result<(), IngestionError> {
        let settings = self.load_settings().await?;
        let entries = self.source.fetch(&settings).await?;
        info!("📦 {} entradas recibidas del proveedor", entries.len());

        for entry in &entries {
            match self.ingest_entry(entry, fetched_at).await {
                Ok(id) => progress.processed.push(id),
                Err(IngestionError::Validation(reason)) => {
                    warn!("⚠️ Entrada omitida: {}", reason);
                    progress.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    async fn ingest_entry(
        &self,
        entry: &TelemetryEntry,
        fetched_at: DateTime<Utc>,
    ) -> Result<Uuid, IngestionError> {
        let normalized = normalize_entry(entry, fetched_at)?;

        let vehicle = self
            .resolver
            .resolve(&normalized.license_plate, &normalized.descriptor, fetched_at)
            .await?;

        let id = self
            .readings
            .insert(NewReading {
                vehicle_id: vehicle.id,
                fields: normalized.fields,
                recorded_at: fetched_at,
            })
            .await?;

        Ok(id)
    }

    async fn record(&self, started_at: DateTime<Utc>, outcome: &IngestionOutcome) {
        let run = IngestionRun::from_outcome(started_at, self.clock.utc(), outcome);
        if let Err(e) = self.runs.record(&run).await {
            warn!("⚠️ No se pudo registrar el ciclo de ingesta: {}", e);
        }
    }
}

/// Configuración completa o `ConfigurationMissing`
pub async fn load_settings(store: &dyn SettingsStore) -> Result<TrackingSettings, IngestionError> {
    let settings = store.load().await?.ok_or_else(|| {
        IngestionError::ConfigurationMissing("tracking settings have not been saved".to_string())
    })?;

    settings.validate().map_err(|e| {
        IngestionError::ConfigurationMissing(format!("incomplete tracking settings: {}", e))
    })?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IngestionStatus, VehicleAttributePolicy};
    use crate::test_support::{
        sample_settings, FixedClock, InMemoryReadingStore, InMemoryRunLog, InMemorySettingsStore,
        InMemoryVehicleStore, StaticTelemetrySource,
    };
    use reqwest::StatusCode;

    struct Harness {
        vehicles: Arc<InMemoryVehicleStore>,
        readings: Arc<InMemoryReadingStore>,
        runs: Arc<InMemoryRunLog>,
        pipeline: IngestionPipeline,
    }

    fn harness(settings: InMemorySettingsStore, source: StaticTelemetrySource) -> Harness {
        harness_with_readings(settings, source, InMemoryReadingStore::default())
    }

    fn harness_with_readings(
        settings: InMemorySettingsStore,
        source: StaticTelemetrySource,
        readings: InMemoryReadingStore,
    ) -> Harness {
        let vehicles = Arc::new(InMemoryVehicleStore::default());
        let readings = Arc::new(readings);
        let runs = Arc::new(InMemoryRunLog::default());
        let pipeline = IngestionPipeline::new(
            Arc::new(settings),
            Arc::new(source),
            RegistryResolver::new(vehicles.clone(), VehicleAttributePolicy::default()),
            readings.clone(),
            runs.clone(),
            Arc::new(FixedClock::default()),
        );
        Harness {
            vehicles,
            readings,
            runs,
            pipeline,
        }
    }

    #[tokio::test]
    async fn test_entries_without_identifier_are_skipped() {
        let body = r#"[
            {"vehicleNo": "DXB-1", "position": "M"},
            {"speed": 40},
            {"vehicleNo": "DXB-2", "ac": "1"}
        ]"#;
        let h = harness(
            InMemorySettingsStore::with(sample_settings()),
            StaticTelemetrySource::ok(body),
        );

        let outcome = h.pipeline.run().await;

        assert!(outcome.is_success());
        assert_eq!(outcome.processed.len(), 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(h.readings.count(), 2);
        assert_eq!(h.vehicles.count(), 2);
    }

    #[tokio::test]
    async fn test_same_plate_twice_reuses_vehicle() {
        let body = r#"[{"vehicleNo": "DXB-1"}, {"vehicleNo": "DXB-1"}]"#;
        let h = harness(
            InMemorySettingsStore::with(sample_settings()),
            StaticTelemetrySource::ok(body),
        );

        let outcome = h.pipeline.run().await;

        assert_eq!(outcome.processed.len(), 2);
        assert_eq!(h.vehicles.count(), 1);
        let stored = h.readings.all();
        assert_eq!(stored[0].vehicle_id, stored[1].vehicle_id);
    }

    #[tokio::test]
    async fn test_missing_settings_is_configuration_error() {
        let h = harness(
            InMemorySettingsStore::default(),
            StaticTelemetrySource::ok("[]"),
        );

        let outcome = h.pipeline.run().await;

        assert_eq!(outcome.status, IngestionStatus::Error);
        assert!(outcome
            .message
            .as_deref()
            .unwrap()
            .starts_with("Configuration missing"));
        assert_eq!(h.runs.all().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_token_is_configuration_error() {
        let mut settings = sample_settings();
        settings.token = String::new();
        let h = harness(
            InMemorySettingsStore::with(settings),
            StaticTelemetrySource::ok("[]"),
        );

        let outcome = h.pipeline.run().await;
        assert_eq!(outcome.status, IngestionStatus::Error);
        assert!(outcome.message.unwrap().contains("Configuration missing"));
    }

    #[tokio::test]
    async fn test_object_body_persists_nothing() {
        let h = harness(
            InMemorySettingsStore::with(sample_settings()),
            StaticTelemetrySource::ok(r#"{"vehicleNo": "DXB-1"}"#),
        );

        let outcome = h.pipeline.run().await;

        assert_eq!(outcome.status, IngestionStatus::Error);
        assert!(outcome.processed.is_empty());
        assert_eq!(h.readings.count(), 0);
        assert_eq!(h.vehicles.count(), 0);
    }

    #[tokio::test]
    async fn test_remote_status_error_aborts_cycle() {
        let h = harness(
            InMemorySettingsStore::with(sample_settings()),
            StaticTelemetrySource::new(StatusCode::BAD_GATEWAY, "[]"),
        );

        let outcome = h.pipeline.run().await;
        assert_eq!(
            outcome.message.as_deref(),
            Some("Remote API returned HTTP 502")
        );
        assert_eq!(h.readings.count(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_committed_ids() {
        let body = r#"[{"vehicleNo": "DXB-1"}, {"vehicleNo": "DXB-2"}, {"vehicleNo": "DXB-3"}]"#;
        let h = harness_with_readings(
            InMemorySettingsStore::with(sample_settings()),
            StaticTelemetrySource::ok(body),
            InMemoryReadingStore::failing_after(1),
        );

        let outcome = h.pipeline.run().await;

        assert_eq!(outcome.status, IngestionStatus::Error);
        assert_eq!(outcome.processed.len(), 1);
        assert_eq!(h.readings.count(), 1);
        assert!(outcome.message.unwrap().starts_with("Persistence error"));

        let runs = h.runs.all();
        assert_eq!(runs[0].status, "error");
        assert_eq!(runs[0].processed, 1);
    }

    #[tokio::test]
    async fn test_rows_carry_the_cycle_time() {
        let h = harness(
            InMemorySettingsStore::with(sample_settings()),
            StaticTelemetrySource::ok(r#"[{"vehicleNo": "DXB-1"}]"#),
        );

        h.pipeline.run().await;

        let cycle_time = FixedClock::default().0;
        assert_eq!(h.readings.all()[0].created_at, cycle_time);
        let vehicle = &h.vehicles.all()[0];
        assert_eq!(vehicle.created_at, cycle_time);
        assert_eq!(vehicle.updated_at, cycle_time);
    }

    #[tokio::test]
    async fn test_successful_cycle_is_logged() {
        let h = harness(
            InMemorySettingsStore::with(sample_settings()),
            StaticTelemetrySource::ok(r#"[{"vehicleNo": "DXB-1"}]"#),
        );

        h.pipeline.run().await;

        let runs = h.runs.all();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, "success");
        assert_eq!(runs[0].processed, 1);
        assert_eq!(runs[0].skipped, 0);
    }
}
