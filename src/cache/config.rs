//! Runtime cache policy derived from `[cache]` settings.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_ENTRY_TTL_SECS: u64 = 300;
const DEFAULT_PAGE_TTL_SECS: u64 = 60;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 150;
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every coordinator call is a miss or a no-op.
    pub enabled: bool,
    /// Expiry for point lookups and per-ddd listings.
    pub entry_ttl: Duration,
    /// Expiry for paged region listings.
    pub page_ttl: Duration,
    /// Upper bound for any single backend call.
    pub operation_timeout: Duration,
    /// Entry limit of the in-process backend.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            entry_ttl: Duration::from_secs(DEFAULT_ENTRY_TTL_SECS),
            page_ttl: Duration::from_secs(DEFAULT_PAGE_TTL_SECS),
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            entry_ttl: Duration::from_secs(u64::from(settings.entry_ttl_secs.get())),
            page_ttl: Duration::from_secs(u64::from(settings.page_ttl_secs.get())),
            operation_timeout: Duration::from_millis(u64::from(
                settings.operation_timeout_ms.get(),
            )),
            memory_capacity: settings.memory_capacity,
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
