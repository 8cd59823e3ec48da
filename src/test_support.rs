//! Shared test doubles: in-memory stores, fixed clocks and a canned
//! telemetry source.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use reqwest::StatusCode;
use uuid::Uuid;

use crate::clients::{parse_telemetry_body, TelemetryEntry, TelemetrySource};
use crate::models::{
    IngestionRun, NewReading, NewVehicle, Reading, ReadingFilters, TrackingSettings, Vehicle,
    VehicleDescriptor,
};
use crate::repositories::{ReadingStore, RunLogStore, SettingsStore, VehicleStore};
use crate::services::scheduling_gate::LastRunStore;
use crate::utils::errors::{AppError, AppResult, IngestionError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn sample_settings() -> TrackingSettings {
    TrackingSettings {
        base_url: "https://telemetry.example.com/api/vehicles".to_string(),
        provider_name: "erpgulf".to_string(),
        token: "secret-token".to_string(),
        frequency_minutes: 5.0,
    }
}

pub fn default_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(default_instant())
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        *lock(&self.0) += delta;
    }

    pub fn now(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now()
    }
}

#[derive(Default)]
pub struct InMemoryLastRunStore(Mutex<Option<DateTime<Utc>>>);

impl InMemoryLastRunStore {
    pub fn current(&self) -> Option<DateTime<Utc>> {
        *lock(&self.0)
    }
}

#[async_trait]
impl LastRunStore for InMemoryLastRunStore {
    async fn last_run(&self) -> Result<Option<DateTime<Utc>>, IngestionError> {
        Ok(self.current())
    }

    async fn record_run(&self, at: DateTime<Utc>) -> Result<(), IngestionError> {
        *lock(&self.0) = Some(at);
        Ok(())
    }
}

/// Redis caído: toda lectura o escritura falla
#[derive(Default)]
pub struct FailingLastRunStore;

#[async_trait]
impl LastRunStore for FailingLastRunStore {
    async fn last_run(&self) -> Result<Option<DateTime<Utc>>, IngestionError> {
        Err(IngestionError::Cache("connection refused".to_string()))
    }

    async fn record_run(&self, _at: DateTime<Utc>) -> Result<(), IngestionError> {
        Err(IngestionError::Cache("connection refused".to_string()))
    }
}

/// Devuelve siempre la misma respuesta HTTP, opcionalmente tras una espera
pub struct StaticTelemetrySource {
    status: StatusCode,
    body: String,
    delay: Option<std::time::Duration>,
}

impl StaticTelemetrySource {
    pub fn new(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn delayed(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TelemetrySource for StaticTelemetrySource {
    async fn fetch(
        &self,
        _settings: &TrackingSettings,
    ) -> Result<Vec<TelemetryEntry>, IngestionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        parse_telemetry_body(self.status, &self.body)
    }
}

#[derive(Default)]
pub struct InMemorySettingsStore(Option<TrackingSettings>);

impl InMemorySettingsStore {
    pub fn with(settings: TrackingSettings) -> Self {
        Self(Some(settings))
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> AppResult<Option<TrackingSettings>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct InMemoryVehicleStore(Mutex<Vec<Vehicle>>);

impl InMemoryVehicleStore {
    pub fn count(&self) -> usize {
        lock(&self.0).len()
    }

    pub fn all(&self) -> Vec<Vehicle> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        Ok(lock(&self.0)
            .iter()
            .find(|vehicle| vehicle.license_plate == license_plate)
            .cloned())
    }

    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let mut vehicles = lock(&self.0);
        if vehicles
            .iter()
            .any(|existing| existing.license_plate == vehicle.license_plate)
        {
            return Err(AppError::Database(sqlx::Error::Protocol(format!(
                "duplicate license plate {}",
                vehicle.license_plate
            ))));
        }

        let created = Vehicle {
            id: Uuid::new_v4(),
            license_plate: vehicle.license_plate,
            vehicle_name: vehicle.vehicle_name,
            make: vehicle.make,
            model: vehicle.model,
            last_odometer: vehicle.last_odometer,
            uom: vehicle.uom,
            created_at: vehicle.registered_at,
            updated_at: vehicle.registered_at,
        };
        vehicles.push(created.clone());
        Ok(created)
    }

    async fn refresh_attributes(
        &self,
        id: Uuid,
        descriptor: &VehicleDescriptor,
        seen_at: DateTime<Utc>,
    ) -> AppResult<Vehicle> {
        let mut vehicles = lock(&self.0);
        let vehicle = vehicles
            .iter_mut()
            .find(|vehicle| vehicle.id == id)
            .ok_or_else(|| AppError::NotFound(format!("vehicle {}", id)))?;

        if let Some(name) = &descriptor.vehicle_name {
            vehicle.vehicle_name = name.clone();
        }
        if let Some(make) = &descriptor.make {
            vehicle.make = make.clone();
        }
        if let Some(model) = &descriptor.model {
            vehicle.model = model.clone();
        }
        if descriptor.odometer.is_some() {
            vehicle.last_odometer = descriptor.odometer;
        }
        if descriptor.uom.is_some() {
            vehicle.uom = descriptor.uom.clone();
        }
        vehicle.updated_at = seen_at;

        Ok(vehicle.clone())
    }

    async fn list(&self) -> AppResult<Vec<Vehicle>> {
        let mut vehicles = self.all();
        vehicles.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
        Ok(vehicles)
    }
}

/// Almacén de lecturas; opcionalmente falla a partir de la n-ésima inserción
#[derive(Default)]
pub struct InMemoryReadingStore {
    readings: Mutex<Vec<Reading>>,
    fail_after: Option<usize>,
}

impl InMemoryReadingStore {
    pub fn failing_after(inserts: usize) -> Self {
        Self {
            readings: Mutex::new(Vec::new()),
            fail_after: Some(inserts),
        }
    }

    pub fn count(&self) -> usize {
        lock(&self.readings).len()
    }

    pub fn all(&self) -> Vec<Reading> {
        lock(&self.readings).clone()
    }
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn insert(&self, reading: NewReading) -> AppResult<Uuid> {
        let mut readings = lock(&self.readings);
        if self.fail_after.is_some_and(|limit| readings.len() >= limit) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let id = Uuid::new_v4();
        readings.push(Reading {
            id,
            vehicle_id: reading.vehicle_id,
            fields: reading.fields,
            created_at: reading.recorded_at,
        });
        Ok(id)
    }

    async fn list(&self, filters: &ReadingFilters) -> AppResult<Vec<Reading>> {
        let mut readings: Vec<Reading> = self
            .all()
            .into_iter()
            .filter(|reading| filters.matches(&reading.fields))
            .collect();
        readings.sort_by(|a, b| b.fields.date.cmp(&a.fields.date));
        readings.truncate(usize::try_from(filters.effective_limit()).unwrap_or(usize::MAX));
        Ok(readings)
    }
}

#[derive(Default)]
pub struct InMemoryRunLog(Mutex<Vec<IngestionRun>>);

impl InMemoryRunLog {
    pub fn all(&self) -> Vec<IngestionRun> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl RunLogStore for InMemoryRunLog {
    async fn record(&self, run: &IngestionRun) -> AppResult<()> {
        lock(&self.0).push(run.clone());
        Ok(())
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<IngestionRun>> {
        let mut runs = self.all();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(runs)
    }
}
