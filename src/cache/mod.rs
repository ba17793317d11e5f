//! Cache-aside layer in front of the relational store.
//!
//! - [`CacheKey`] renders deterministic keys such as `region:ddd:11`; entries
//!   live under `<key>:<generation>` ([`PinnedKey`]).
//! - [`deps`] maps each kind of committed write to the keys it makes stale.
//! - [`CacheCoordinator`] performs lookups, population and invalidation with
//!   every backend call bounded by a short timeout.
//! - [`RedisCache`] and [`MemoryCache`] implement [`CacheBackend`].
//!
//! The store is always the source of truth. A read pins its key to the
//! current generation before touching the store, and a committed write
//! retires that generation. A reader that loaded the store before the commit
//! therefore populates an entry nobody will read again. Only a failed
//! invalidation leaves stale data reachable, until its TTL expires.
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379/"
//! operation_timeout_ms = 150
//! entry_ttl_secs = 300
//! page_ttl_secs = 60
//! ```

mod backend;
mod config;
mod coordinator;
pub mod deps;
mod keys;
mod lock;
mod memory;
mod redis_cache;

pub use backend::{CacheBackend, CacheBackendError};
pub use config::CacheConfig;
pub use coordinator::{
    CacheCoordinator, InvalidationReport, METRIC_CACHE_ERROR, METRIC_CACHE_HIT,
    METRIC_CACHE_INVALIDATE, METRIC_CACHE_MISS,
};
pub use deps::{InvalidationPlan, Mutation, MutationKind};
pub use keys::{CacheKey, GenerationKey, PinnedKey, canonical_param};
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
