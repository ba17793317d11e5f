//! Repository traits describing persistence adapters.
//!
//! Every read is scoped to live (not soft-deleted) rows unless the method
//! name says otherwise. Writes never remove rows physically.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{ContactRecord, RegionRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateRegionParams {
    pub name: String,
    pub ddd: String,
}

#[derive(Debug, Clone)]
pub struct UpdateRegionParams {
    pub id: Uuid,
    pub name: String,
    pub ddd: String,
}

#[derive(Debug, Clone)]
pub struct CreateContactParams {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub region_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateContactParams {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub region_id: Uuid,
}

#[async_trait]
pub trait RegionsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RegionRecord>, RepoError>;

    async fn find_by_id_including_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<RegionRecord>, RepoError>;

    async fn find_by_ddd(&self, ddd: &str) -> Result<Option<RegionRecord>, RepoError>;

    /// Returns one page of live regions ordered by ddd, plus the live total.
    async fn list_page(&self, page: PageRequest)
    -> Result<(Vec<RegionRecord>, u64), RepoError>;
}

#[async_trait]
pub trait RegionsWriteRepo: Send + Sync {
    async fn create_region(&self, params: CreateRegionParams) -> Result<RegionRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when the row is missing or deleted.
    async fn update_region(&self, params: UpdateRegionParams) -> Result<RegionRecord, RepoError>;

    /// Flips `is_deleted` and returns the row as it is after the flip.
    async fn soft_delete_region(&self, id: Uuid) -> Result<RegionRecord, RepoError>;
}

#[async_trait]
pub trait ContactsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContactRecord>, RepoError>;

    async fn find_by_id_including_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<ContactRecord>, RepoError>;

    async fn list_by_region(&self, region_id: Uuid) -> Result<Vec<ContactRecord>, RepoError>;
}

#[async_trait]
pub trait ContactsWriteRepo: Send + Sync {
    async fn create_contact(&self, params: CreateContactParams)
    -> Result<ContactRecord, RepoError>;

    async fn update_contact(&self, params: UpdateContactParams)
    -> Result<ContactRecord, RepoError>;

    async fn soft_delete_contact(&self, id: Uuid) -> Result<ContactRecord, RepoError>;
}

/// Liveness probe for the system of record.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
