use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::PageRequest,
    application::repos::{
        CreateRegionParams, RegionsRepo, RegionsWriteRepo, RepoError, UpdateRegionParams,
    },
    domain::entities::RegionRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const REGION_COLUMNS: &str = "id, name, ddd, is_deleted, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RegionRow {
    id: Uuid,
    name: String,
    ddd: String,
    is_deleted: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<RegionRow> for RegionRecord {
    fn from(row: RegionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            ddd: row.ddd,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl RegionsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RegionRecord>, RepoError> {
        let sql = format!("SELECT {REGION_COLUMNS} FROM regions WHERE id = $1 AND NOT is_deleted");
        let row = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(RegionRecord::from))
    }

    async fn find_by_id_including_deleted(
        &self,
        id: Uuid,
    ) -> Result<Option<RegionRecord>, RepoError> {
        let sql = format!("SELECT {REGION_COLUMNS} FROM regions WHERE id = $1");
        let row = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(RegionRecord::from))
    }

    async fn find_by_ddd(&self, ddd: &str) -> Result<Option<RegionRecord>, RepoError> {
        let sql =
            format!("SELECT {REGION_COLUMNS} FROM regions WHERE ddd = $1 AND NOT is_deleted");
        let row = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(ddd)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(RegionRecord::from))
    }

    async fn list_page(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<RegionRecord>, u64), RepoError> {
        let limit = i64::try_from(page.limit())
            .map_err(|_| RepoError::InvalidInput {
                message: "page size out of range".to_string(),
            })?;
        let offset = i64::try_from(page.offset())
            .map_err(|_| RepoError::InvalidInput {
                message: "page offset out of range".to_string(),
            })?;

        let sql = format!(
            "SELECT {REGION_COLUMNS} FROM regions WHERE NOT is_deleted \
             ORDER BY ddd, id LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM regions WHERE NOT is_deleted")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok((
            rows.into_iter().map(RegionRecord::from).collect(),
            Self::convert_count(total)?,
        ))
    }
}

#[async_trait]
impl RegionsWriteRepo for PostgresRepositories {
    async fn create_region(&self, params: CreateRegionParams) -> Result<RegionRecord, RepoError> {
        let sql = format!(
            "INSERT INTO regions (id, name, ddd) VALUES ($1, $2, $3) RETURNING {REGION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&params.name)
            .bind(&params.ddd)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_region(&self, params: UpdateRegionParams) -> Result<RegionRecord, RepoError> {
        let sql = format!(
            "UPDATE regions SET name = $2, ddd = $3, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted RETURNING {REGION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(params.id)
            .bind(&params.name)
            .bind(&params.ddd)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(RegionRecord::from).ok_or(RepoError::NotFound)
    }

    async fn soft_delete_region(&self, id: Uuid) -> Result<RegionRecord, RepoError> {
        let sql = format!(
            "UPDATE regions SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted RETURNING {REGION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RegionRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(RegionRecord::from).ok_or(RepoError::NotFound)
    }
}
