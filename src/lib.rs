//! Vehicle tracker
//!
//! Ingesta periódica de telemetría de flotas: consulta al proveedor remoto,
//! registra los vehículos en su primer avistamiento y guarda una lectura
//! normalizada por cada entrada.

pub mod cache;
pub mod clients;
pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
