//! Cache key definitions.
//!
//! Every key is derived from entity kind, operation and parameters. The
//! rendered form (`region:ddd:11`) is what reaches the backend, so it has to
//! stay stable across releases and across instances sharing one cache.
//!
//! Entries are versioned: a [`CacheKey`] is stored under
//! `<key>:<generation>`, where the generation is read from its
//! [`GenerationKey`] before the store is consulted. Invalidation deletes the
//! generation, which makes every entry written under it unreachable, including
//! one written late by a reader that loaded the store before the commit.

use std::fmt;

use uuid::Uuid;

use crate::application::pagination::PageRequest;

/// A cached read.
///
/// Build keys through the constructor functions: they canonicalize string
/// parameters so `" 11"` and `"11"` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    RegionById(Uuid),
    RegionByDdd(String),
    RegionWithContacts(String),
    RegionPage { page: u32, page_size: u32 },
    ContactById(Uuid),
    ContactsByDdd(String),
}

impl CacheKey {
    pub fn region_by_id(id: Uuid) -> Self {
        Self::RegionById(id)
    }

    pub fn region_by_ddd(ddd: &str) -> Self {
        Self::RegionByDdd(canonical_param(ddd))
    }

    pub fn region_with_contacts(ddd: &str) -> Self {
        Self::RegionWithContacts(canonical_param(ddd))
    }

    pub fn region_page(request: PageRequest) -> Self {
        Self::RegionPage {
            page: request.page(),
            page_size: request.page_size(),
        }
    }

    pub fn contact_by_id(id: Uuid) -> Self {
        Self::ContactById(id)
    }

    pub fn contacts_by_ddd(ddd: &str) -> Self {
        Self::ContactsByDdd(canonical_param(ddd))
    }

    /// Entity kind segment, also used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegionById(_)
            | Self::RegionByDdd(_)
            | Self::RegionWithContacts(_)
            | Self::RegionPage { .. } => "region",
            Self::ContactById(_) | Self::ContactsByDdd(_) => "contact",
        }
    }

    /// Operation segment, also used as a metrics label.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::RegionById(_) | Self::ContactById(_) => "id",
            Self::RegionByDdd(_) => "ddd",
            Self::RegionWithContacts(_) => "dddcontacts",
            Self::RegionPage { .. } => "page",
            Self::ContactsByDdd(_) => "byddd",
        }
    }

    /// Listing keys are cheap to rebuild and expensive to invalidate precisely.
    pub fn is_listing(&self) -> bool {
        matches!(self, Self::RegionPage { .. })
    }

    /// Every page of the region listing shares one generation.
    pub fn generation_key(&self) -> GenerationKey {
        match self {
            Self::RegionPage { .. } => GenerationKey::RegionPages,
            other => GenerationKey::Entry(other.clone()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        let op = self.operation();
        match self {
            Self::RegionById(id) | Self::ContactById(id) => write!(f, "{kind}:{op}:{id}"),
            Self::RegionByDdd(ddd) | Self::RegionWithContacts(ddd) | Self::ContactsByDdd(ddd) => {
                write!(f, "{kind}:{op}:{ddd}")
            }
            Self::RegionPage { page, page_size } => write!(f, "{kind}:{op}:{page}:{page_size}"),
        }
    }
}

/// The stamp that versions one or more cache entries. Mutations delete these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenerationKey {
    Entry(CacheKey),
    RegionPages,
}

impl GenerationKey {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Entry(key) => key.kind(),
            Self::RegionPages => "region",
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Entry(key) => key.operation(),
            Self::RegionPages => "page",
        }
    }
}

impl fmt::Display for GenerationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(key) => write!(f, "{key}:generation"),
            Self::RegionPages => f.write_str("region:page:generation"),
        }
    }
}

/// A key bound to the generation that was current when a read began.
///
/// Without a generation (cache disabled or unreachable) the read bypasses
/// the cache entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedKey {
    key: CacheKey,
    generation: Option<String>,
}

impl PinnedKey {
    pub fn new(key: CacheKey, generation: Option<String>) -> Self {
        Self { key, generation }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn generation(&self) -> Option<&str> {
        self.generation.as_deref()
    }

    /// Backend key of the entry, `None` when unpinned.
    pub fn rendered(&self) -> Option<String> {
        self.generation
            .as_ref()
            .map(|generation| format!("{}:{generation}", self.key))
    }
}

/// Trim, lowercase and escape the segment separator.
///
/// `%` is escaped first so an escaped `:` can never be confused with a
/// parameter that literally contains `%3a`.
pub fn canonical_param(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace('%', "%25")
        .replace(':', "%3a")
}
