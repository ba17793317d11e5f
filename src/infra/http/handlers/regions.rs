use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{body, path};
use crate::application::error::AppError;
use crate::application::pagination::{DEFAULT_PAGE_SIZE, PageRequest};
use crate::application::regions::{CreateRegionCommand, UpdateRegionCommand};
use crate::infra::http::models::{
    ApiResponse, CreateRegionRequest, PageQuery, PagedResponse, UpdateRegionRequest,
};
use crate::infra::http::state::AppState;

pub async fn list_regions(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let request = PageRequest::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    );
    let page = state.regions.list_paged(request).await?;
    Ok(Json(PagedResponse::from(page)))
}

pub async fn get_region_by_id(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let region = state.regions.get_by_id(path(id)?).await?;
    Ok(Json(ApiResponse::ok(region)))
}

pub async fn get_region_by_ddd(
    State(state): State<AppState>,
    Path(ddd): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let region = state.regions.get_by_ddd(&ddd).await?;
    Ok(Json(match region {
        Some(region) => ApiResponse::ok(region),
        None => ApiResponse::absent(),
    }))
}

pub async fn get_region_with_contacts(
    State(state): State<AppState>,
    Path(ddd): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.regions.get_by_ddd_with_contacts(&ddd).await?;
    Ok(Json(match view {
        Some(view) => ApiResponse::ok(view),
        None => ApiResponse::absent(),
    }))
}

pub async fn create_region(
    State(state): State<AppState>,
    payload: Result<Json<CreateRegionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = body(payload)?;
    let region = state
        .regions
        .create(CreateRegionCommand {
            name: request.name,
            ddd: request.ddd,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(region))))
}

pub async fn update_region(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRegionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = body(payload)?;
    state
        .regions
        .update(UpdateRegionCommand {
            id: request.id,
            name: request.name,
            ddd: request.ddd,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_region(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    state.regions.soft_delete(path(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
