use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::error::ErrorReport;
use crate::infra::http::models::ApiResponse;
use crate::infra::http::state::AppState;

/// Pings the store only; a cache outage does not make the service unhealthy.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(ApiResponse::ok("healthy")).into_response(),
        Err(err) => {
            let status = StatusCode::SERVICE_UNAVAILABLE;
            let mut response =
                (status, Json(ApiResponse::<()>::failure("Store unavailable."))).into_response();
            ErrorReport::from_error("infra::http::health", status, &err).attach(&mut response);
            response
        }
    }
}
