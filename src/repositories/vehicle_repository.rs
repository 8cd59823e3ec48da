use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewVehicle, Vehicle, VehicleDescriptor};
use crate::utils::errors::AppResult;

/// Registro de vehículos por matrícula
#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>>;
    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle>;
    /// Sobrescribir sólo los atributos que trae el descriptor
    async fn refresh_attributes(
        &self,
        id: Uuid,
        descriptor: &VehicleDescriptor,
        seen_at: DateTime<Utc>,
    ) -> AppResult<Vehicle>;
    async fn list(&self) -> AppResult<Vec<Vehicle>>;
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for VehicleRepository {
    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE license_plate = $1")
                .bind(license_plate)
                .fetch_optional(&self.pool)
                .await?;

        Ok(vehicle)
    }

    // Sin ON CONFLICT: dos procesos creando la misma matrícula chocan con el
    // índice único y el segundo ciclo termina con error de persistencia.
    async fn create(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, license_plate, vehicle_name, make, model, last_odometer, uom, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vehicle.license_plate)
        .bind(vehicle.vehicle_name)
        .bind(vehicle.make)
        .bind(vehicle.model)
        .bind(vehicle.last_odometer)
        .bind(vehicle.uom)
        .bind(vehicle.registered_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn refresh_attributes(
        &self,
        id: Uuid,
        descriptor: &VehicleDescriptor,
        seen_at: DateTime<Utc>,
    ) -> AppResult<Vehicle> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET vehicle_name = COALESCE($2, vehicle_name),
                make = COALESCE($3, make),
                model = COALESCE($4, model),
                last_odometer = COALESCE($5, last_odometer),
                uom = COALESCE($6, uom),
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(descriptor.vehicle_name.as_deref())
        .bind(descriptor.make.as_deref())
        .bind(descriptor.model.as_deref())
        .bind(descriptor.odometer)
        .bind(descriptor.uom.as_deref())
        .bind(seen_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    async fn list(&self) -> AppResult<Vec<Vehicle>> {
        let vehicles =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles ORDER BY license_plate")
                .fetch_all(&self.pool)
                .await?;

        Ok(vehicles)
    }
}
