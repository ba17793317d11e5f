//! Request bodies and the JSON response envelope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::pagination::Paged;

/// `{ "success": bool, "error": string|null, "data": T|null }`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    /// Successful lookup that matched nothing.
    pub fn absent() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub success: bool,
    pub error: Option<String>,
    pub data: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> From<Paged<T>> for PagedResponse<T> {
    fn from(page: Paged<T>) -> Self {
        Self {
            success: true,
            error: None,
            data: page.items,
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateRegionRequest {
    pub name: String,
    pub ddd: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateRegionRequest {
    pub id: Uuid,
    pub name: String,
    pub ddd: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub region_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactRequest {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub region_id: Uuid,
}
