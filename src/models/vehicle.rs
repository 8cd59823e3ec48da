//! Modelo de Vehicle
//!
//! Este módulo contiene el registro de vehículos que alimenta la ingesta de
//! telemetría. Mapea exactamente a la tabla `vehicles` con primary key 'id'.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Valor usado cuando la entrada no trae marca o modelo
pub const UNKNOWN_ATTRIBUTE: &str = "Unknown";

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub vehicle_name: String,
    pub make: String,
    pub model: String,
    pub last_odometer: Option<Decimal>,
    pub uom: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Atributos descriptivos que trae una entrada de telemetría
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleDescriptor {
    pub vehicle_name: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub odometer: Option<Decimal>,
    pub uom: Option<String>,
}

impl VehicleDescriptor {
    /// La entrada trae al menos un atributo descriptivo
    pub fn has_attributes(&self) -> bool {
        self.vehicle_name.is_some()
            || self.make.is_some()
            || self.model.is_some()
            || self.odometer.is_some()
            || self.uom.is_some()
    }
}

/// Vehículo pendiente de insertar
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub license_plate: String,
    pub vehicle_name: String,
    pub make: String,
    pub model: String,
    pub last_odometer: Option<Decimal>,
    pub uom: Option<String>,
    /// Hora del ciclo en que apareció por primera vez
    pub registered_at: DateTime<Utc>,
}

impl NewVehicle {
    /// Construir un vehículo a partir de la primera entrada en la que aparece
    pub fn from_descriptor(
        license_plate: &str,
        descriptor: &VehicleDescriptor,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            license_plate: license_plate.to_string(),
            vehicle_name: descriptor
                .vehicle_name
                .clone()
                .unwrap_or_else(|| license_plate.to_string()),
            make: descriptor
                .make
                .clone()
                .unwrap_or_else(|| UNKNOWN_ATTRIBUTE.to_string()),
            model: descriptor
                .model
                .clone()
                .unwrap_or_else(|| UNKNOWN_ATTRIBUTE.to_string()),
            last_odometer: descriptor.odometer,
            uom: descriptor.uom.clone(),
            registered_at,
        }
    }
}

/// Qué hacer con los atributos de un vehículo ya registrado
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleAttributePolicy {
    /// Los atributos se fijan al crear el vehículo y no se vuelven a tocar
    #[default]
    FirstWriteWins,
    /// Cada avistamiento sobrescribe los atributos que trae la entrada
    RefreshOnSighting,
}

impl FromStr for VehicleAttributePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first_write_wins" => Ok(Self::FirstWriteWins),
            "refresh_on_sighting" => Ok(Self::RefreshOnSighting),
            other => Err(format!("unknown vehicle attribute policy '{}'", other)),
        }
    }
}

impl fmt::Display for VehicleAttributePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstWriteWins => f.write_str("first_write_wins"),
            Self::RefreshOnSighting => f.write_str("refresh_on_sighting"),
        }
    }
}
