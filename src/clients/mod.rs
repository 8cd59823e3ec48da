//! Clients - HTTP clients for external APIs
//!
//! This module contains the client for the remote telemetry provider.

pub mod telemetry_client;

pub use telemetry_client::{
    parse_telemetry_body, TelemetryEntry, TelemetryHttpClient, TelemetrySource,
};
