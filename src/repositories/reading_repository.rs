use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{
    ExtraFields, NewReading, OnOff, Position, Reading, ReadingFields, ReadingFilters, YesNo,
};
use crate::utils::errors::AppResult;

/// Lecturas de telemetría; sólo se insertan, nunca se actualizan
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert(&self, reading: NewReading) -> AppResult<Uuid>;
    async fn list(&self, filters: &ReadingFilters) -> AppResult<Vec<Reading>>;
}

pub struct ReadingRepository {
    pool: PgPool,
}

impl ReadingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Fila tal como vive en Postgres; las banderas se guardan como texto
#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    id: Uuid,
    vehicle_id: Uuid,
    reg_no: String,
    reading_date: DateTime<Utc>,
    last_seen: Option<DateTime<Utc>>,
    last_communication: Option<DateTime<Utc>>,
    position: String,
    ignition: String,
    ac: String,
    camera: String,
    geofence: String,
    alert: String,
    odometer: Option<Decimal>,
    speed: Option<f64>,
    distance: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    battery_voltage: Option<f64>,
    fuel_litres: Option<f64>,
    temperature_celsius: Option<f64>,
    today_working_ms: Option<i64>,
    driver: Option<String>,
    driver_mobile: Option<String>,
    nearest_location: Option<String>,
    duration: Option<String>,
    installation_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    map_link: Option<String>,
    extra_fields: Json<ExtraFields>,
    created_at: DateTime<Utc>,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        Reading {
            id: row.id,
            vehicle_id: row.vehicle_id,
            fields: ReadingFields {
                reg_no: row.reg_no,
                date: row.reading_date,
                last_seen: row.last_seen,
                last_communication: row.last_communication,
                position: Position::from_code(&row.position),
                ignition: OnOff::parse_stored(&row.ignition),
                ac: OnOff::parse_stored(&row.ac),
                camera: OnOff::parse_stored(&row.camera),
                geofence: YesNo::parse_stored(&row.geofence),
                alert: YesNo::parse_stored(&row.alert),
                odometer: row.odometer,
                speed: row.speed,
                distance: row.distance,
                latitude: row.latitude,
                longitude: row.longitude,
                battery_voltage: row.battery_voltage,
                fuel_litres: row.fuel_litres,
                temperature_celsius: row.temperature_celsius,
                today_working_ms: row.today_working_ms,
                driver: row.driver,
                driver_mobile: row.driver_mobile,
                nearest_location: row.nearest_location,
                duration: row.duration,
                installation_date: row.installation_date,
                expiry_date: row.expiry_date,
                map_link: row.map_link,
                extra_fields: row.extra_fields.0,
            },
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ReadingStore for ReadingRepository {
    async fn insert(&self, reading: NewReading) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let fields = reading.fields;
        let recorded_at = reading.recorded_at;

        sqlx::query(
            r#"
            INSERT INTO readings (
                id, vehicle_id, reg_no, reading_date, last_seen, last_communication,
                position, ignition, ac, camera, geofence, alert,
                odometer, speed, distance, latitude, longitude,
                battery_voltage, fuel_litres, temperature_celsius, today_working_ms,
                driver, driver_mobile, nearest_location, duration,
                installation_date, expiry_date, map_link, extra_fields, created_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17,
                $18, $19, $20, $21,
                $22, $23, $24, $25,
                $26, $27, $28, $29, $30
            )
            "#,
        )
        .bind(id)
        .bind(reading.vehicle_id)
        .bind(fields.reg_no)
        .bind(fields.date)
        .bind(fields.last_seen)
        .bind(fields.last_communication)
        .bind(fields.position.as_str())
        .bind(fields.ignition.as_str())
        .bind(fields.ac.as_str())
        .bind(fields.camera.as_str())
        .bind(fields.geofence.as_str())
        .bind(fields.alert.as_str())
        .bind(fields.odometer)
        .bind(fields.speed)
        .bind(fields.distance)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.battery_voltage)
        .bind(fields.fuel_litres)
        .bind(fields.temperature_celsius)
        .bind(fields.today_working_ms)
        .bind(fields.driver)
        .bind(fields.driver_mobile)
        .bind(fields.nearest_location)
        .bind(fields.duration)
        .bind(fields.installation_date)
        .bind(fields.expiry_date)
        .bind(fields.map_link)
        .bind(Json(fields.extra_fields))
        .bind(recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list(&self, filters: &ReadingFilters) -> AppResult<Vec<Reading>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM readings WHERE 1 = 1");

        if let Some(reg_no) = &filters.reg_no {
            query.push(" AND reg_no = ").push_bind(reg_no.clone());
        }
        if let Some(from) = filters.from {
            query.push(" AND reading_date >= ").push_bind(from);
        }
        if let Some(to) = filters.to {
            query.push(" AND reading_date <= ").push_bind(to);
        }
        query
            .push(" ORDER BY reading_date DESC, created_at DESC LIMIT ")
            .push_bind(filters.effective_limit());

        let rows = query
            .build_query_as::<ReadingRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Reading::from).collect())
    }
}
