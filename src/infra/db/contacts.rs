use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        ContactsRepo, ContactsWriteRepo, CreateContactParams, RepoError, UpdateContactParams,
    },
    domain::entities::ContactRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const CONTACT_COLUMNS: &str =
    "id, name, phone, email, region_id, is_deleted, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    phone: String,
    email: String,
    region_id: Uuid,
    is_deleted: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ContactRow> for ContactRecord {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            region_id: row.region_id,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ContactsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContactRecord>, RepoError> {
        let sql =
            format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND NOT is_deleted");
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ContactRecord::from))
    }

    async fn find_by_id_including_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<ContactRecord>, RepoError> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1");
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ContactRecord::from))
    }

    async fn list_by_region(&self, region_id: Uuid) -> Result<Vec<ContactRecord>, RepoError> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts \
             WHERE region_id = $1 AND NOT is_deleted ORDER BY name, id"
        );
        let rows = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(region_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ContactRecord::from).collect())
    }
}

#[async_trait]
impl ContactsWriteRepo for PostgresRepositories {
    async fn create_contact(
        &self,
        params: CreateContactParams,
    ) -> Result<ContactRecord, RepoError> {
        let sql = format!(
            "INSERT INTO contacts (id, name, phone, email, region_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CONTACT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&params.name)
            .bind(&params.phone)
            .bind(&params.email)
            .bind(params.region_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_contact(
        &self,
        params: UpdateContactParams,
    ) -> Result<ContactRecord, RepoError> {
        let sql = format!(
            "UPDATE contacts SET name = $2, phone = $3, email = $4, region_id = $5, \
             updated_at = now() WHERE id = $1 AND NOT is_deleted RETURNING {CONTACT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(params.id)
            .bind(&params.name)
            .bind(&params.phone)
            .bind(&params.email)
            .bind(params.region_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ContactRecord::from).ok_or(RepoError::NotFound)
    }

    async fn soft_delete_contact(&self, id: Uuid) -> Result<ContactRecord, RepoError> {
        let sql = format!(
            "UPDATE contacts SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted RETURNING {CONTACT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ContactRecord::from).ok_or(RepoError::NotFound)
    }
}
