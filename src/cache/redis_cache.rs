//! Redis backend.
//!
//! The connection is established lazily on first use so the service can boot
//! while Redis is down; until it comes back every call fails fast and the
//! coordinator treats it as a miss.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tracing::info;

use super::backend::{CacheBackend, CacheBackendError};

pub struct RedisCache {
    client: redis::Client,
    connection: RwLock<Option<ConnectionManager>>,
}

impl RedisCache {
    /// Parses the URL without connecting.
    pub fn open(url: &str) -> Result<Self, CacheBackendError> {
        let client = redis::Client::open(url).map_err(CacheBackendError::unavailable)?;
        Ok(Self {
            client,
            connection: RwLock::new(None),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheBackendError> {
        if let Some(manager) = self.connection.read().await.as_ref() {
            return Ok(manager.clone());
        }

        let mut slot = self.connection.write().await;
        if let Some(manager) = slot.as_ref() {
            return Ok(manager.clone());
        }
        let manager = self
            .client
            .get_connection_manager()
            .await
            .map_err(CacheBackendError::unavailable)?;
        info!(target_module = "cache::redis_cache", "Connected to redis");
        *slot = Some(manager.clone());
        Ok(manager)
    }
}

/// `SETEX` rejects a zero expiry.
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheBackendError> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(CacheBackendError::unavailable)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheBackendError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value.as_ref(), expiry_secs(ttl))
            .await
            .map_err(CacheBackendError::unavailable)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(CacheBackendError::unavailable)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
