//! Cache
//!
//! Este módulo contiene el cache compartido (Redis) donde vive el estado del scheduler.

pub mod cache_config;
pub mod redis_client;

pub use cache_config::{CacheConfig, CacheOperations};
pub use redis_client::RedisClient;
