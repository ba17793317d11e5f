use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{
    ContactsRepo, ContactsWriteRepo, CreateContactParams, RegionsRepo, RepoError,
    UpdateContactParams,
};
use crate::cache::{CacheCoordinator, CacheKey, Mutation};
use crate::domain::entities::{ContactRecord, RegionRecord};
use crate::domain::validation;

const ENTITY: &str = "Contact";
const REGION_NOT_FOUND: &str = "region not found";

#[derive(Debug, Clone)]
pub struct CreateContactCommand {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub region_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateContactCommand {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub region_id: Uuid,
}

#[derive(Clone)]
pub struct ContactService {
    reader: Arc<dyn ContactsRepo>,
    writer: Arc<dyn ContactsWriteRepo>,
    regions: Arc<dyn RegionsRepo>,
    cache: CacheCoordinator,
}

impl ContactService {
    pub fn new(
        reader: Arc<dyn ContactsRepo>,
        writer: Arc<dyn ContactsWriteRepo>,
        regions: Arc<dyn RegionsRepo>,
        cache: CacheCoordinator,
    ) -> Self {
        Self {
            reader,
            writer,
            regions,
            cache,
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ContactRecord, AppError> {
        let key = self.cache.pin(CacheKey::contact_by_id(id)).await;
        if let Some(contact) = self.cache.try_get::<ContactRecord>(&key).await {
            return Ok(contact);
        }

        let contact = self.find_live(id).await?;
        self.cache.populate(&key, &contact).await;
        Ok(contact)
    }

    /// Live contacts of the live region owning `ddd`.
    pub async fn get_by_ddd(&self, ddd: &str) -> Result<Vec<ContactRecord>, AppError> {
        let key = self.cache.pin(CacheKey::contacts_by_ddd(ddd)).await;
        if let Some(contacts) = self.cache.try_get::<Vec<ContactRecord>>(&key).await {
            return Ok(contacts);
        }

        let region = self
            .regions
            .find_by_ddd(ddd.trim())
            .await?
            .filter(RegionRecord::is_live)
            .ok_or_else(|| AppError::not_found("Region"))?;
        let contacts: Vec<ContactRecord> = self
            .reader
            .list_by_region(region.id)
            .await?
            .into_iter()
            .filter(ContactRecord::is_live)
            .collect();

        self.cache.populate(&key, &contacts).await;
        Ok(contacts)
    }

    pub async fn create(&self, command: CreateContactCommand) -> Result<ContactRecord, AppError> {
        let name = validation::name(&command.name, "name")?;
        let phone = validation::phone(&command.phone)?;
        let email = validation::email(&command.email)?;
        let region = self.live_region(command.region_id).await?;

        let contact = self
            .writer
            .create_contact(CreateContactParams {
                name,
                phone,
                email,
                region_id: region.id,
            })
            .await
            .map_err(map_write_error)?;

        self.cache
            .apply(&Mutation::contact_created(&contact, &region.ddd))
            .await;
        info!(contact_id = %contact.id, region_id = %region.id, "Contact created");
        Ok(contact)
    }

    pub async fn update(&self, command: UpdateContactCommand) -> Result<ContactRecord, AppError> {
        let name = validation::name(&command.name, "name")?;
        let phone = validation::phone(&command.phone)?;
        let email = validation::email(&command.email)?;

        let before = self.find_live(command.id).await?;
        let target = self.live_region(command.region_id).await?;
        let previous_ddd = self.region_ddd(before.region_id).await?;

        let after = self
            .writer
            .update_contact(UpdateContactParams {
                id: command.id,
                name,
                phone,
                email,
                region_id: target.id,
            })
            .await
            .map_err(map_write_error)?;

        self.cache
            .apply(&Mutation::contact_updated(
                &after,
                previous_ddd.as_deref(),
                &target.ddd,
            ))
            .await;
        info!(contact_id = %after.id, region_id = %target.id, "Contact updated");
        Ok(after)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        let before = self.find_live(id).await?;
        let region_ddd = self.region_ddd(before.region_id).await?;

        let deleted = self
            .writer
            .soft_delete_contact(id)
            .await
            .map_err(map_write_error)?;

        self.cache
            .apply(&Mutation::contact_deleted(&deleted, region_ddd.as_deref()))
            .await;
        info!(contact_id = %deleted.id, "Contact soft-deleted");
        Ok(())
    }

    async fn find_live(&self, id: Uuid) -> Result<ContactRecord, AppError> {
        self.reader
            .find_by_id(id)
            .await?
            .filter(ContactRecord::is_live)
            .ok_or_else(|| AppError::not_found(ENTITY))
    }

    async fn live_region(&self, region_id: Uuid) -> Result<RegionRecord, AppError> {
        self.regions
            .find_by_id(region_id)
            .await?
            .filter(RegionRecord::is_live)
            .ok_or_else(|| AppError::validation(REGION_NOT_FOUND))
    }

    /// Ddd of a contact's region, deleted regions included, for key construction.
    async fn region_ddd(&self, region_id: Uuid) -> Result<Option<String>, AppError> {
        let region = self.regions.find_by_id_including_deleted(region_id).await?;
        Ok(region.map(|region| region.ddd))
    }
}

fn map_write_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound => AppError::not_found(ENTITY),
        RepoError::InvalidInput { .. } => AppError::validation(REGION_NOT_FOUND),
        other => other.into(),
    }
}
