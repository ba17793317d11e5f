use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::pagination::{PageRequest, Paged};
use crate::application::repos::{
    ContactsRepo, CreateRegionParams, RegionsRepo, RegionsWriteRepo, RepoError,
    UpdateRegionParams,
};
use crate::cache::{CacheCoordinator, CacheKey, Mutation};
use crate::domain::entities::{RegionRecord, RegionWithContacts};
use crate::domain::validation;

const ENTITY: &str = "Region";

#[derive(Debug, Clone)]
pub struct CreateRegionCommand {
    pub name: String,
    pub ddd: String,
}

#[derive(Debug, Clone)]
pub struct UpdateRegionCommand {
    pub id: Uuid,
    pub name: String,
    pub ddd: String,
}

#[derive(Clone)]
pub struct RegionService {
    reader: Arc<dyn RegionsRepo>,
    writer: Arc<dyn RegionsWriteRepo>,
    contacts: Arc<dyn ContactsRepo>,
    cache: CacheCoordinator,
}

impl RegionService {
    pub fn new(
        reader: Arc<dyn RegionsRepo>,
        writer: Arc<dyn RegionsWriteRepo>,
        contacts: Arc<dyn ContactsRepo>,
        cache: CacheCoordinator,
    ) -> Self {
        Self {
            reader,
            writer,
            contacts,
            cache,
        }
    }

    pub async fn create(&self, command: CreateRegionCommand) -> Result<RegionRecord, AppError> {
        let name = validation::name(&command.name, "name")?;
        let ddd = validation::ddd(&command.ddd)?;
        self.ensure_ddd_available(&ddd, None).await?;

        let region = self
            .writer
            .create_region(CreateRegionParams { name, ddd })
            .await
            .map_err(map_write_error)?;

        self.cache.apply(&Mutation::region_created(&region)).await;
        info!(region_id = %region.id, ddd = %region.ddd, "Region created");
        Ok(region)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<RegionRecord, AppError> {
        let key = self.cache.pin(CacheKey::region_by_id(id)).await;
        if let Some(region) = self.cache.try_get::<RegionRecord>(&key).await {
            return Ok(region);
        }

        let region = self
            .reader
            .find_by_id(id)
            .await?
            .filter(RegionRecord::is_live)
            .ok_or_else(|| AppError::not_found(ENTITY))?;

        self.cache.populate(&key, &region).await;
        Ok(region)
    }

    /// Absent when no live region owns `ddd`. Absent results are not cached.
    pub async fn get_by_ddd(&self, ddd: &str) -> Result<Option<RegionRecord>, AppError> {
        let key = self.cache.pin(CacheKey::region_by_ddd(ddd)).await;
        if let Some(region) = self.cache.try_get::<RegionRecord>(&key).await {
            return Ok(Some(region));
        }

        let Some(region) = self.find_live_by_ddd(ddd).await? else {
            debug!(ddd = ddd.trim(), "No live region for ddd");
            return Ok(None);
        };

        self.cache.populate(&key, &region).await;
        Ok(Some(region))
    }

    pub async fn get_by_ddd_with_contacts(
        &self,
        ddd: &str,
    ) -> Result<Option<RegionWithContacts>, AppError> {
        let key = self.cache.pin(CacheKey::region_with_contacts(ddd)).await;
        if let Some(view) = self.cache.try_get::<RegionWithContacts>(&key).await {
            return Ok(Some(view));
        }

        let Some(region) = self.find_live_by_ddd(ddd).await? else {
            return Ok(None);
        };
        let contacts = self
            .contacts
            .list_by_region(region.id)
            .await?
            .into_iter()
            .filter(|contact| contact.is_live())
            .collect();
        let view = RegionWithContacts { region, contacts };

        self.cache.populate(&key, &view).await;
        Ok(Some(view))
    }

    pub async fn list_paged(&self, request: PageRequest) -> Result<Paged<RegionRecord>, AppError> {
        let key = self.cache.pin(CacheKey::region_page(request)).await;
        if let Some(page) = self.cache.try_get::<Paged<RegionRecord>>(&key).await {
            return Ok(page);
        }

        let (items, total) = self.reader.list_page(request).await?;
        let page = Paged::new(items, request, total);

        self.cache.populate(&key, &page).await;
        Ok(page)
    }

    pub async fn update(&self, command: UpdateRegionCommand) -> Result<RegionRecord, AppError> {
        let name = validation::name(&command.name, "name")?;
        let ddd = validation::ddd(&command.ddd)?;

        let before = self
            .reader
            .find_by_id(command.id)
            .await?
            .filter(RegionRecord::is_live)
            .ok_or_else(|| AppError::not_found(ENTITY))?;
        if before.ddd != ddd {
            self.ensure_ddd_available(&ddd, Some(before.id)).await?;
        }

        let after = self
            .writer
            .update_region(UpdateRegionParams {
                id: command.id,
                name,
                ddd,
            })
            .await
            .map_err(map_write_error)?;

        self.cache.apply(&Mutation::region_updated(&before, &after)).await;
        info!(
            region_id = %after.id,
            ddd_before = %before.ddd,
            ddd_after = %after.ddd,
            "Region updated"
        );
        Ok(after)
    }

    /// Flags the region as deleted. Its contacts are left untouched.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let exists = self
            .reader
            .find_by_id(id)
            .await?
            .is_some_and(|region| region.is_live());
        if !exists {
            return Err(AppError::not_found(ENTITY));
        }

        let deleted = self
            .writer
            .soft_delete_region(id)
            .await
            .map_err(map_write_error)?;

        self.cache.apply(&Mutation::region_deleted(&deleted)).await;
        info!(region_id = %deleted.id, ddd = %deleted.ddd, "Region soft-deleted");
        Ok(())
    }

    async fn find_live_by_ddd(&self, ddd: &str) -> Result<Option<RegionRecord>, AppError> {
        let region = self.reader.find_by_ddd(ddd.trim()).await?;
        Ok(region.filter(RegionRecord::is_live))
    }

    async fn ensure_ddd_available(&self, ddd: &str, owner: Option<Uuid>) -> Result<(), AppError> {
        match self.find_live_by_ddd(ddd).await? {
            Some(existing) if Some(existing.id) != owner => Err(duplicate_ddd(ddd)),
            _ => Ok(()),
        }
    }
}

fn duplicate_ddd(ddd: &str) -> AppError {
    AppError::validation(format!("ddd {ddd} is already assigned to another region"))
}

fn map_write_error(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate { .. } => {
            AppError::validation("ddd is already assigned to another region")
        }
        RepoError::NotFound => AppError::not_found(ENTITY),
        other => other.into(),
    }
}
