//! HTTP surface: routes mirror `/region/...` and `/contact/...` of the
//! public directory API.

pub mod handlers;
mod middleware;
pub mod models;
mod state;

pub use state::AppState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};

use self::middleware::{log_responses, set_request_context};

pub fn build_router(state: AppState) -> Router {
    let regions = Router::new()
        .route(
            "/region",
            post(handlers::create_region).put(handlers::update_region),
        )
        .route("/region/get-all", get(handlers::list_regions))
        .route("/region/get-by-id/{id}", get(handlers::get_region_by_id))
        .route("/region/get-by-ddd/{ddd}", get(handlers::get_region_by_ddd))
        .route(
            "/region/get-ddd-with-contacts/{ddd}",
            get(handlers::get_region_with_contacts),
        )
        .route("/region/{id}", delete(handlers::delete_region));

    let contacts = Router::new()
        .route(
            "/contact",
            post(handlers::create_contact).put(handlers::update_contact),
        )
        .route("/contact/get-by-id/{id}", get(handlers::get_contact_by_id))
        .route(
            "/contact/get-by-ddd/{ddd}",
            get(handlers::get_contacts_by_ddd),
        )
        .route("/contact/{id}", delete(handlers::delete_contact));

    regions
        .merge(contacts)
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
