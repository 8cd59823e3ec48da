//! Configuración de cache
//!
//! Este módulo contiene la configuración y las operaciones del cache compartido.

use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Configuración del cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "vehicle_tracker".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            ..defaults
        }
    }
}

/// Operaciones de cache
#[async_trait::async_trait]
pub trait CacheOperations {
    /// Un valor que no se puede deserializar cuenta como ausente; los errores
    /// de Redis se propagan.
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;
    /// Guardar sin expiración
    async fn set_persistent<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;
}
