#![allow(dead_code)]

use std::collections::HashMap;
use std::future::pending;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use ddd_directory::application::contacts::{ContactService, CreateContactCommand};
use ddd_directory::application::pagination::PageRequest;
use ddd_directory::application::regions::{CreateRegionCommand, RegionService};
use ddd_directory::application::repos::{
    ContactsRepo, ContactsWriteRepo, CreateContactParams, CreateRegionParams, RegionsRepo,
    RegionsWriteRepo, RepoError, StoreHealth, UpdateContactParams, UpdateRegionParams,
};
use ddd_directory::cache::{
    CacheBackend, CacheBackendError, CacheConfig, CacheCoordinator, MemoryCache,
};
use ddd_directory::domain::entities::{ContactRecord, RegionRecord};
use ddd_directory::infra::http::{AppState, build_router};

/// Pauses the next read that passes through it, after the data was loaded
/// and before it is returned, until the test releases it.
#[derive(Default)]
pub struct Gate {
    armed: AtomicBool,
    loaded: Notify,
    release: Notify,
}

impl Gate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Resolves once the held read has loaded its data.
    pub async fn loaded(&self) {
        self.loaded.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.loaded.notify_one();
            self.release.notified().await;
        }
    }
}

/// In-memory system of record with the same liveness rules as Postgres.
#[derive(Default)]
pub struct InMemoryStore {
    regions: Mutex<HashMap<Uuid, RegionRecord>>,
    contacts: Mutex<HashMap<Uuid, ContactRecord>>,
    reads: AtomicUsize,
    unavailable: AtomicBool,
    /// Holds `RegionsRepo::find_by_id`.
    pub region_lookups: Gate,
    /// Holds `ContactsRepo::list_by_region`.
    pub contact_listings: Gate,
}

impl InMemoryStore {
    /// Store reads served so far, used to tell cache hits from misses.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn raw_region(&self, id: Uuid) -> Option<RegionRecord> {
        self.regions.lock().await.get(&id).cloned()
    }

    pub async fn raw_contact(&self, id: Uuid) -> Option<ContactRecord> {
        self.contacts.lock().await.get(&id).cloned()
    }

    pub async fn contact_count(&self) -> usize {
        self.contacts.lock().await.len()
    }

    fn read(&self) -> Result<(), RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.available()
    }

    fn available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepoError::Persistence("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn live_ddd_taken(regions: &HashMap<Uuid, RegionRecord>, ddd: &str, owner: Uuid) -> bool {
        regions
            .values()
            .any(|region| region.is_live() && region.ddd == ddd && region.id != owner)
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

fn duplicate_ddd() -> RepoError {
    RepoError::Duplicate {
        constraint: "regions_live_ddd_key".to_string(),
    }
}

#[async_trait]
impl RegionsRepo for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RegionRecord>, RepoError> {
        self.read()?;
        let found = {
            let regions = self.regions.lock().await;
            regions.get(&id).filter(|region| region.is_live()).cloned()
        };
        self.region_lookups.pass().await;
        Ok(found)
    }

    async fn find_by_id_including_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<RegionRecord>, RepoError> {
        self.read()?;
        Ok(self.regions.lock().await.get(&id).cloned())
    }

    async fn find_by_ddd(&self, ddd: &str) -> Result<Option<RegionRecord>, RepoError> {
        self.read()?;
        let regions = self.regions.lock().await;
        Ok(regions
            .values()
            .find(|region| region.is_live() && region.ddd == ddd)
            .cloned())
    }

    async fn list_page(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<RegionRecord>, u64), RepoError> {
        self.read()?;
        let regions = self.regions.lock().await;
        let mut live: Vec<RegionRecord> = regions
            .values()
            .filter(|region| region.is_live())
            .cloned()
            .collect();
        live.sort_by(|a, b| a.ddd.cmp(&b.ddd).then(a.id.cmp(&b.id)));
        let total = live.len() as u64;
        let items = live
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((items, total))
    }
}

#[async_trait]
impl RegionsWriteRepo for InMemoryStore {
    async fn create_region(&self, params: CreateRegionParams) -> Result<RegionRecord, RepoError> {
        self.available()?;
        let mut regions = self.regions.lock().await;
        if Self::live_ddd_taken(&regions, &params.ddd, Uuid::nil()) {
            return Err(duplicate_ddd());
        }
        let stamp = now();
        let region = RegionRecord {
            id: Uuid::new_v4(),
            name: params.name,
            ddd: params.ddd,
            is_deleted: false,
            created_at: stamp,
            updated_at: stamp,
        };
        regions.insert(region.id, region.clone());
        Ok(region)
    }

    async fn update_region(&self, params: UpdateRegionParams) -> Result<RegionRecord, RepoError> {
        self.available()?;
        let mut regions = self.regions.lock().await;
        if Self::live_ddd_taken(&regions, &params.ddd, params.id) {
            return Err(duplicate_ddd());
        }
        let region = regions
            .get_mut(&params.id)
            .filter(|region| region.is_live())
            .ok_or(RepoError::NotFound)?;
        region.name = params.name;
        region.ddd = params.ddd;
        region.updated_at = now();
        Ok(region.clone())
    }

    async fn soft_delete_region(&self, id: Uuid) -> Result<RegionRecord, RepoError> {
        self.available()?;
        let mut regions = self.regions.lock().await;
        let region = regions
            .get_mut(&id)
            .filter(|region| region.is_live())
            .ok_or(RepoError::NotFound)?;
        region.is_deleted = true;
        region.updated_at = now();
        Ok(region.clone())
    }
}

#[async_trait]
impl ContactsRepo for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContactRecord>, RepoError> {
        self.read()?;
        let contacts = self.contacts.lock().await;
        Ok(contacts.get(&id).filter(|contact| contact.is_live()).cloned())
    }

    async fn find_by_id_including_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<ContactRecord>, RepoError> {
        self.read()?;
        Ok(self.contacts.lock().await.get(&id).cloned())
    }

    async fn list_by_region(&self, region_id: Uuid) -> Result<Vec<ContactRecord>, RepoError> {
        self.read()?;
        let mut listed: Vec<ContactRecord> = {
            let contacts = self.contacts.lock().await;
            contacts
                .values()
                .filter(|contact| contact.is_live() && contact.region_id == region_id)
                .cloned()
                .collect()
        };
        listed.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        self.contact_listings.pass().await;
        Ok(listed)
    }
}

#[async_trait]
impl ContactsWriteRepo for InMemoryStore {
    async fn create_contact(
        &self,
        params: CreateContactParams,
    ) -> Result<ContactRecord, RepoError> {
        self.available()?;
        if !self.regions.lock().await.contains_key(&params.region_id) {
            return Err(RepoError::InvalidInput {
                message: "contacts_region_id_fkey".to_string(),
            });
        }
        let stamp = now();
        let contact = ContactRecord {
            id: Uuid::new_v4(),
            name: params.name,
            phone: params.phone,
            email: params.email,
            region_id: params.region_id,
            is_deleted: false,
            created_at: stamp,
            updated_at: stamp,
        };
        self.contacts
            .lock()
            .await
            .insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn update_contact(
        &self,
        params: UpdateContactParams,
    ) -> Result<ContactRecord, RepoError> {
        self.available()?;
        if !self.regions.lock().await.contains_key(&params.region_id) {
            return Err(RepoError::InvalidInput {
                message: "contacts_region_id_fkey".to_string(),
            });
        }
        let mut contacts = self.contacts.lock().await;
        let contact = contacts
            .get_mut(&params.id)
            .filter(|contact| contact.is_live())
            .ok_or(RepoError::NotFound)?;
        contact.name = params.name;
        contact.phone = params.phone;
        contact.email = params.email;
        contact.region_id = params.region_id;
        contact.updated_at = now();
        Ok(contact.clone())
    }

    async fn soft_delete_contact(&self, id: Uuid) -> Result<ContactRecord, RepoError> {
        self.available()?;
        let mut contacts = self.contacts.lock().await;
        let contact = contacts
            .get_mut(&id)
            .filter(|contact| contact.is_live())
            .ok_or(RepoError::NotFound)?;
        contact.is_deleted = true;
        contact.updated_at = now();
        Ok(contact.clone())
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        self.available()
    }
}

/// Backend whose every call fails immediately.
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheBackendError> {
        Err(CacheBackendError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheBackendError> {
        Err(CacheBackendError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheBackendError> {
        Err(CacheBackendError::unavailable("connection refused"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Backend whose every call never completes.
pub struct HangingCache;

#[async_trait]
impl CacheBackend for HangingCache {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheBackendError> {
        pending().await
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheBackendError> {
        pending().await
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheBackendError> {
        pending().await
    }

    fn name(&self) -> &'static str {
        "hanging"
    }
}

/// Services wired to one in-memory store and one cache backend.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub cache: CacheCoordinator,
    pub regions: Arc<RegionService>,
    pub contacts: Arc<ContactService>,
}

impl Harness {
    pub fn with_memory_cache() -> (Self, Arc<MemoryCache>) {
        let memory = Arc::new(MemoryCache::new(
            NonZeroUsize::new(1_024).expect("non-zero capacity"),
        ));
        let harness = Self::with_backend(memory.clone());
        (harness, memory)
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_coordinator(CacheCoordinator::new(CacheConfig::default(), backend))
    }

    pub fn with_coordinator(cache: CacheCoordinator) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let regions = Arc::new(RegionService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            cache.clone(),
        ));
        let contacts = Arc::new(ContactService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            cache.clone(),
        ));
        Self {
            store,
            cache,
            regions,
            contacts,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            regions: self.regions.clone(),
            contacts: self.contacts.clone(),
            store: self.store.clone(),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state())
    }

    pub async fn region(&self, name: &str, ddd: &str) -> RegionRecord {
        self.regions
            .create(CreateRegionCommand {
                name: name.to_string(),
                ddd: ddd.to_string(),
            })
            .await
            .expect("region should be created")
    }

    pub async fn contact(&self, name: &str, region_id: Uuid) -> ContactRecord {
        self.contacts
            .create(CreateContactCommand {
                name: name.to_string(),
                phone: "4141-3338".to_string(),
                email: format!("{}@email.com", name.to_lowercase()),
                region_id,
            })
            .await
            .expect("contact should be created")
    }
}
