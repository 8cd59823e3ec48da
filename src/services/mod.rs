//! Services module
//!
//! Este módulo contiene la lógica de negocio de la ingesta de telemetría:
//! normalización, resolución de vehículos, pipeline, gate de frecuencia y
//! scheduler.

pub mod ingestion_service;
pub mod normalization;
pub mod registry_resolver;
pub mod scheduler;
pub mod scheduling_gate;

pub use ingestion_service::IngestionPipeline;
pub use registry_resolver::RegistryResolver;
pub use scheduler::{IngestionScheduler, TickResult};
pub use scheduling_gate::{GateDecision, LastRunStore, SchedulingGate};
