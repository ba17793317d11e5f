use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use super::{body, path};
use crate::application::contacts::{CreateContactCommand, UpdateContactCommand};
use crate::application::error::AppError;
use crate::infra::http::models::{ApiResponse, CreateContactRequest, UpdateContactRequest};
use crate::infra::http::state::AppState;

pub async fn get_contact_by_id(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let contact = state.contacts.get_by_id(path(id)?).await?;
    Ok(Json(ApiResponse::ok(contact)))
}

pub async fn get_contacts_by_ddd(
    State(state): State<AppState>,
    Path(ddd): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let contacts = state.contacts.get_by_ddd(&ddd).await?;
    Ok(Json(ApiResponse::ok(contacts)))
}

pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<CreateContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = body(payload)?;
    state
        .contacts
        .create(CreateContactCommand {
            name: request.name,
            phone: request.phone,
            email: request.email,
            region_id: request.region_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_contact(
    State(state): State<AppState>,
    payload: Result<Json<UpdateContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = body(payload)?;
    state
        .contacts
        .update(UpdateContactCommand {
            id: request.id,
            name: request.name,
            phone: request.phone,
            email: request.email,
            region_id: request.region_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_contact(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    state.contacts.soft_delete(path(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
