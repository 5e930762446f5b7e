//! Axum application setup
//!
//! Creates and configures the Axum application with routes and middleware.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::coordinator::UpdateCoordinatorGeneric;
use crate::extractor::{BrowserDriver, SessionDriver};

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState<D: SessionDriver = BrowserDriver> {
    /// Coordinator serving reads and refresh requests
    pub coordinator: Arc<UpdateCoordinatorGeneric<D>>,
}

// Manual impl: cloning the state must not require a cloneable driver
impl<D: SessionDriver> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

/// Create the main Axum application with routes and middleware
pub fn create_app<D>(coordinator: Arc<UpdateCoordinatorGeneric<D>>) -> Router
where
    D: SessionDriver + 'static,
{
    let state = AppState { coordinator };

    Router::new()
        .route("/", get(super::handlers::index))
        .route("/token", get(super::handlers::get_token::<D>))
        .route("/update", get(super::handlers::request_update::<D>))
        .fallback(super::handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
