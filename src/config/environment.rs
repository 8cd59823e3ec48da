//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Las credenciales del proveedor de telemetría NO viven aquí: se leen de la
//! tabla `tracking_settings` en cada ciclo.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::models::VehicleAttributePolicy;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    /// Cada cuánto despierta el scheduler para consultar la compuerta
    pub scheduler_tick_secs: u64,
    /// Timeout del cliente HTTP hacia el proveedor de telemetría
    pub telemetry_timeout_secs: u64,
    /// Timeout de las peticiones entrantes a la API
    pub request_timeout_secs: u64,
    pub vehicle_attribute_policy: VehicleAttributePolicy,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            scheduler_tick_secs: 60,
            telemetry_timeout_secs: 30,
            request_timeout_secs: 120,
            vehicle_attribute_policy: VehicleAttributePolicy::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración del entorno; las variables ausentes usan el default
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or(defaults.cors_origins),
            scheduler_tick_secs: parse_var("SCHEDULER_TICK_SECS", defaults.scheduler_tick_secs)?,
            telemetry_timeout_secs: parse_var(
                "TELEMETRY_TIMEOUT_SECS",
                defaults.telemetry_timeout_secs,
            )?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            vehicle_attribute_policy: parse_var(
                "VEHICLE_ATTRIBUTE_POLICY",
                defaults.vehicle_attribute_policy,
            )?,
        })
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_secs(self.scheduler_tick_secs.max(1))
    }

    pub fn telemetry_timeout(&self) -> Duration {
        Duration::from_secs(self.telemetry_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        _ => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
