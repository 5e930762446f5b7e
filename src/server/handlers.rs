//! HTTP request handlers
//!
//! Implementation of the publishing API endpoints: everything is a read or
//! a refresh trigger; no handler ever waits on an in-progress attempt.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};

use crate::coordinator::RefreshOutcome;
use crate::extractor::SessionDriver;
use crate::server::app::AppState;

/// Root endpoint
///
/// GET /
///
/// Redirects to the token endpoint.
pub async fn index() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/token")])
}

/// Current token endpoint
///
/// GET /token
///
/// Returns the last successfully captured record, or 503 until the first
/// capture ever succeeds.
pub async fn get_token<D: SessionDriver + 'static>(
    State(state): State<AppState<D>>,
) -> Response {
    match state.coordinator.read() {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Token has not yet been generated, try again later.",
        )
            .into_response(),
    }
}

/// Refresh trigger endpoint
///
/// GET /update
///
/// Asks the coordinator for an update ahead of the next scheduled tick.
pub async fn request_update<D: SessionDriver + 'static>(
    State(state): State<AppState<D>>,
) -> &'static str {
    match state.coordinator.request_refresh() {
        RefreshOutcome::Accepted => "Update request accepted, new token will be generated soon.",
        RefreshOutcome::AlreadyPending => {
            "Update has already been requested, new token will be generated soon."
        }
    }
}

/// Fallback for unknown paths
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
