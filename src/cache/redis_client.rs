use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, RedisResult};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};

use super::{CacheConfig, CacheOperations};
use crate::services::scheduling_gate::LastRunStore;
use crate::utils::errors::IngestionError;

/// Cliente Redis con connection manager y operaciones async
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(config: CacheConfig) -> Result<Self> {
        info!("🔗 Conectando a Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager, config })
    }

    /// Generar clave de cache con prefijo
    fn make_key(&self, prefix: &str, identifier: &str) -> String {
        format!("{}:{}:{}", self.config.key_prefix, prefix, identifier)
    }

    /// Clave con la hora de la última ejecución del scheduler
    pub fn last_run_key(&self) -> String {
        self.make_key("scheduler", "last_run")
    }
}

#[async_trait]
impl CacheOperations for RedisClient {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();

        let value = conn.get::<_, Option<String>>(key).await.map_err(|e| {
            error!("❌ Error leyendo cache para clave {}: {}", key, e);
            anyhow::anyhow!("Error de Redis: {}", e)
        })?;

        match value {
            Some(value) => match serde_json::from_str(&value) {
                Ok(deserialized) => {
                    debug!("📥 Cache HIT para clave: {}", key);
                    Ok(Some(deserialized))
                }
                Err(e) => {
                    warn!("⚠️ Valor ilegible en cache para clave {}: {}", key, e);
                    Ok(None)
                }
            },
            None => {
                debug!("❌ Cache MISS para clave: {}", key);
                Ok(None)
            }
        }
    }

    async fn set_persistent<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.manager.clone();

        let serialized = serde_json::to_string(value)?;
        let result: RedisResult<()> = conn.set(key, serialized).await;

        match result {
            Ok(()) => {
                debug!("💾 Cache SET para clave: {} (sin TTL)", key);
                Ok(())
            }
            Err(e) => {
                error!("❌ Error guardando en cache para clave {}: {}", key, e);
                Err(anyhow::anyhow!("Error de Redis: {}", e))
            }
        }
    }
}

/// Un valor ilegible equivale a "nunca se ejecutó"
fn parse_last_run(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(e) => {
            warn!("⚠️ Última ejecución ilegible '{}': {}", raw, e);
            None
        }
    }
}

#[async_trait]
impl LastRunStore for RedisClient {
    /// Sin Redis no se puede decidir: el error llega al tick, que no ejecuta
    async fn last_run(&self) -> Result<Option<DateTime<Utc>>, IngestionError> {
        let key = self.last_run_key();

        let raw = self
            .get::<String>(&key)
            .await
            .map_err(|e| IngestionError::Cache(e.to_string()))?;
        Ok(raw.as_deref().and_then(parse_last_run))
    }

    async fn record_run(&self, at: DateTime<Utc>) -> Result<(), IngestionError> {
        let key = self.last_run_key();
        self.set_persistent(&key, &at.to_rfc3339())
            .await
            .map_err(|e| IngestionError::Cache(e.to_string()))
    }
}
