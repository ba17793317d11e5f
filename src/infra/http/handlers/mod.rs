//! Route handlers. Extractor rejections are turned into validation errors so
//! every failure leaves in the same envelope.

mod contacts;
mod health;
mod regions;

pub use contacts::{
    create_contact, delete_contact, get_contact_by_id, get_contacts_by_ddd, update_contact,
};
pub use health::health;
pub use regions::{
    create_region, delete_region, get_region_by_ddd, get_region_by_id, get_region_with_contacts,
    list_regions, update_region,
};

use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};

use crate::application::error::AppError;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

fn path<T>(param: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}
