//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Sólo contiene traits para poder construirlo
//! sin base de datos en los tests.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{ReadingStore, RunLogStore, VehicleStore};
use crate::services::IngestionScheduler;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub scheduler: Arc<IngestionScheduler>,
    pub vehicles: Arc<dyn VehicleStore>,
    pub readings: Arc<dyn ReadingStore>,
    pub runs: Arc<dyn RunLogStore>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        scheduler: Arc<IngestionScheduler>,
        vehicles: Arc<dyn VehicleStore>,
        readings: Arc<dyn ReadingStore>,
        runs: Arc<dyn RunLogStore>,
    ) -> Self {
        Self {
            config,
            scheduler,
            vehicles,
            readings,
            runs,
        }
    }
}
