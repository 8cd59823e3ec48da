//! Resolución de vehículos
//!
//! Traduce la matrícula de una entrada al vehículo registrado, creándolo en
//! su primer avistamiento.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::models::{NewVehicle, Vehicle, VehicleAttributePolicy, VehicleDescriptor};
use crate::repositories::VehicleStore;
use crate::utils::errors::{AppError, AppResult};

pub struct RegistryResolver {
    vehicles: Arc<dyn VehicleStore>,
    policy: VehicleAttributePolicy,
}

impl RegistryResolver {
    pub fn new(vehicles: Arc<dyn VehicleStore>, policy: VehicleAttributePolicy) -> Self {
        Self { vehicles, policy }
    }

    /// `seen_at` es la hora del ciclo; queda como alta o última actualización
    pub async fn resolve(
        &self,
        license_plate: &str,
        descriptor: &VehicleDescriptor,
        seen_at: DateTime<Utc>,
    ) -> AppResult<Vehicle> {
        if license_plate.trim().is_empty() {
            return Err(AppError::BadRequest(
                "license plate must not be empty".to_string(),
            ));
        }

        if let Some(existing) = self.vehicles.find_by_license_plate(license_plate).await? {
            return match self.policy {
                VehicleAttributePolicy::RefreshOnSighting if descriptor.has_attributes() => {
                    debug!("🔄 Actualizando atributos del vehículo {}", license_plate);
                    self.vehicles
                        .refresh_attributes(existing.id, descriptor, seen_at)
                        .await
                }
                _ => Ok(existing),
            };
        }

        let vehicle = self
            .vehicles
            .create(NewVehicle::from_descriptor(license_plate, descriptor, seen_at))
            .await?;
        info!("🚚 Vehículo registrado: {} ({})", vehicle.license_plate, vehicle.id);

        Ok(vehicle)
    }
}
