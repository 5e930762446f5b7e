//! HTTP publishing API
//!
//! A minimal read surface over the coordinator: the cached token and a
//! refresh trigger. Runs unauthenticated and is meant for a trusted network.

pub mod app;
pub mod handlers;

pub use app::{AppState, create_app};
