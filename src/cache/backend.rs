//! Key/value backends the coordinator talks to.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Failure of a single cache call. Never leaves the coordinator.
#[derive(Debug, Error)]
pub enum CacheBackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("cache payload could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CacheBackendError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    /// Short label used for the `reason` metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Timeout(_) => "timeout",
            Self::Codec(_) => "codec",
        }
    }
}

/// A distributed key/value store with per-key expiry.
///
/// Implementations give no multi-key atomicity; each call stands alone.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheBackendError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheBackendError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheBackendError>;

    fn name(&self) -> &'static str;
}
