use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use crate::cache::CacheBackendError;

/// Failures while wiring the service to its store, cache and listener.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("database url is not configured")]
    MissingDatabaseUrl,
    #[error("failed to connect to the database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("failed to apply migrations: {0}")]
    Migrate(#[source] sqlx::Error),
    #[error("invalid cache backend settings: {0}")]
    CacheBackend(#[from] CacheBackendError),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(#[from] TryInitError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("http server failed: {0}")]
    Server(#[from] std::io::Error),
}

impl InfraError {
    /// Whether the failure comes from the store being unreachable.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Migrate(_))
    }
}
