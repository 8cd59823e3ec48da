//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean al schema PostgreSQL
//! del tracker de vehículos.

pub mod ingestion_run;
pub mod reading;
pub mod settings;
pub mod vehicle;

pub use ingestion_run::{IngestionOutcome, IngestionRun, IngestionStatus};
pub use reading::{
    ExtraFields, ExtraValue, NewReading, OnOff, Position, Reading, ReadingFields, ReadingFilters,
    YesNo,
};
pub use settings::TrackingSettings;
pub use vehicle::{NewVehicle, Vehicle, VehicleAttributePolicy, VehicleDescriptor};
