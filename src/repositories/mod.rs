//! Repositorios
//!
//! Cada repositorio expone un trait (usado por los servicios) y su
//! implementación sobre PostgreSQL.

pub mod reading_repository;
pub mod run_log_repository;
pub mod settings_repository;
pub mod vehicle_repository;

pub use reading_repository::{ReadingRepository, ReadingStore};
pub use run_log_repository::{RunLogRepository, RunLogStore};
pub use settings_repository::{SettingsRepository, SettingsStore};
pub use vehicle_repository::{VehicleRepository, VehicleStore};
