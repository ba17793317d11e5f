//! Cache-aside coordination.
//!
//! The coordinator is the only component that talks to a [`CacheBackend`].
//! Reads pin their key to a generation, consult the cache and populate it
//! after a miss; writes commit to the store first and then hand a
//! [`Mutation`] to [`apply`], which retires the affected generations.
//! Backend failures and timeouts are logged and counted here and never
//! reach callers.
//!
//! [`apply`]: CacheCoordinator::apply

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::backend::{CacheBackend, CacheBackendError};
use super::config::CacheConfig;
use super::deps::{InvalidationPlan, Mutation};
use super::keys::{CacheKey, GenerationKey, PinnedKey};
use super::memory::MemoryCache;

pub const METRIC_CACHE_HIT: &str = "directory_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "directory_cache_miss_total";
pub const METRIC_CACHE_ERROR: &str = "directory_cache_error_total";
pub const METRIC_CACHE_INVALIDATE: &str = "directory_cache_invalidate_total";

/// Outcome of a best-effort invalidation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationReport {
    pub deleted: usize,
    pub failed: usize,
}

impl InvalidationReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Clone)]
pub struct CacheCoordinator {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
}

impl CacheCoordinator {
    pub fn new(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self { config, backend }
    }

    /// A coordinator that never caches.
    pub fn disabled() -> Self {
        let config = CacheConfig::disabled();
        let backend = Arc::new(MemoryCache::new(NonZeroUsize::MIN));
        Self::new(config, backend)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Expiry applied to entries stored under `key`.
    pub fn ttl_for(&self, key: &CacheKey) -> Duration {
        if key.is_listing() {
            self.config.page_ttl
        } else {
            self.config.entry_ttl
        }
    }

    /// Binds `key` to its current generation, minting one if absent.
    ///
    /// Call this before reading the store. A mutation that commits after the
    /// pin retires the generation, so whatever the read populates under it is
    /// never served. The key comes back unpinned when the generation cannot
    /// be read or stored, and the read then bypasses the cache.
    pub async fn pin(&self, key: CacheKey) -> PinnedKey {
        if !self.config.enabled {
            return PinnedKey::new(key, None);
        }

        let slot = key.generation_key();
        let rendered = slot.to_string();
        match self.bounded(self.backend.get(&rendered)).await {
            Ok(Some(payload)) => {
                if let Ok(generation) = serde_json::from_slice::<String>(&payload) {
                    return PinnedKey::new(key, Some(generation));
                }
            }
            Ok(None) => {}
            Err(err) => {
                self.record_failure(&rendered, slot.kind(), "get", &err);
                return PinnedKey::new(key, None);
            }
        }

        let generation = Uuid::new_v4().simple().to_string();
        let payload = match serde_json::to_vec(&generation) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                let err = CacheBackendError::Codec(err);
                self.record_failure(&rendered, slot.kind(), "encode", &err);
                return PinnedKey::new(key, None);
            }
        };
        match self
            .bounded(self.backend.set(&rendered, payload, self.config.entry_ttl))
            .await
        {
            Ok(()) => {
                debug!(key = %rendered, generation = %generation, "Minted cache generation");
                PinnedKey::new(key, Some(generation))
            }
            Err(err) => {
                self.record_failure(&rendered, slot.kind(), "set", &err);
                PinnedKey::new(key, None)
            }
        }
    }

    /// Looks up `pinned`. Any failure, including an undecodable payload, is a miss.
    pub async fn try_get<T>(&self, pinned: &PinnedKey) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let rendered = pinned.rendered()?;
        let key = pinned.key();
        let payload = match self.bounded(self.backend.get(&rendered)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "kind" => key.kind(), "op" => key.operation())
                    .increment(1);
                debug!(key = %rendered, result = "miss", "Cache lookup");
                return None;
            }
            Err(err) => {
                self.record_failure(&rendered, key.kind(), "get", &err);
                return None;
            }
        };

        match serde_json::from_slice::<T>(&payload) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "kind" => key.kind(), "op" => key.operation())
                    .increment(1);
                debug!(key = %rendered, result = "hit", "Cache lookup");
                Some(value)
            }
            Err(err) => {
                let err = CacheBackendError::Codec(err);
                self.record_failure(&rendered, key.kind(), "decode", &err);
                if let Err(err) = self.bounded(self.backend.delete(&rendered)).await {
                    self.record_failure(&rendered, key.kind(), "delete", &err);
                }
                None
            }
        }
    }

    /// Stores `value` under `pinned` with the key's TTL. Failures are logged and swallowed.
    pub async fn populate<T>(&self, pinned: &PinnedKey, value: &T)
    where
        T: Serialize + Sync + ?Sized,
    {
        let Some(rendered) = pinned.rendered() else {
            return;
        };
        let key = pinned.key();
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                let err = CacheBackendError::Codec(err);
                self.record_failure(&rendered, key.kind(), "encode", &err);
                return;
            }
        };

        let ttl = self.ttl_for(key);
        match self.bounded(self.backend.set(&rendered, payload, ttl)).await {
            Ok(()) => debug!(key = %rendered, ttl_secs = ttl.as_secs(), "Cache populated"),
            Err(err) => self.record_failure(&rendered, key.kind(), "set", &err),
        }
    }

    /// Retires every generation, continuing past individual failures.
    pub async fn invalidate<I>(&self, slots: I) -> InvalidationReport
    where
        I: IntoIterator<Item = GenerationKey>,
    {
        if !self.config.enabled {
            return InvalidationReport::default();
        }

        let deletions = slots.into_iter().map(|slot| async move {
            let rendered = slot.to_string();
            let outcome = self.bounded(self.backend.delete(&rendered)).await;
            (slot, rendered, outcome)
        });

        let mut report = InvalidationReport::default();
        for (slot, rendered, outcome) in join_all(deletions).await {
            match outcome {
                Ok(()) => {
                    counter!(
                        METRIC_CACHE_INVALIDATE,
                        "kind" => slot.kind(),
                        "op" => slot.operation()
                    )
                    .increment(1);
                    report.deleted += 1;
                }
                Err(err) => {
                    self.record_failure(&rendered, slot.kind(), "delete", &err);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Expands `mutation` through the dependency table and invalidates the result.
    ///
    /// Must only be called after the store write has committed.
    pub async fn apply(&self, mutation: &Mutation) -> InvalidationReport {
        let plan = InvalidationPlan::for_mutation(mutation);
        debug!(mutation = mutation.kind.as_str(), keys = %plan, "Applying invalidation plan");
        let report = self.invalidate(plan.slots).await;
        if !report.is_complete() {
            warn!(
                mutation = mutation.kind.as_str(),
                id = %mutation.id,
                failed = report.failed,
                "Invalidation incomplete; affected entries expire by TTL"
            );
        }
        report
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, CacheBackendError>
    where
        F: Future<Output = Result<T, CacheBackendError>>,
    {
        let limit = self.config.operation_timeout;
        match tokio::time::timeout(limit, operation).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CacheBackendError::Timeout(limit)),
        }
    }

    fn record_failure(
        &self,
        rendered: &str,
        kind: &'static str,
        op: &'static str,
        err: &CacheBackendError,
    ) {
        counter!(
            METRIC_CACHE_ERROR,
            "kind" => kind,
            "op" => op,
            "reason" => err.reason()
        )
        .increment(1);
        warn!(
            key = %rendered,
            op,
            backend = self.backend.name(),
            error = %err,
            "Cache operation failed; continuing without cache"
        );
    }
}
