//! potoken-provider - caching proof-of-origin token provider
//!
//! Captures a YouTube POT token and its paired visitor data by watching the
//! network traffic of a real (headless) browser session while it plays a
//! video, keeps the most recent successful capture in memory, and republishes
//! it over a small read-only HTTP API.
//!
//! # Architecture
//!
//! - [`UpdateCoordinator`]: owns the cached [`TokenRecord`], runs extraction
//!   attempts one at a time, merges forced-refresh requests, and drives the
//!   periodic refresh schedule.
//! - [`extractor::BrowserDriver`]: performs one extraction attempt by
//!   launching an isolated Chromium session and intercepting the player API
//!   request.
//! - [`server`]: the axum application exposing `/token` and `/update`.
//!
//! # Examples
//!
//! ```rust
//! use potoken_provider::{Settings, UpdateCoordinator};
//!
//! let settings = Settings::default();
//! let coordinator = UpdateCoordinator::new(settings);
//! assert!(coordinator.read().is_none());
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod extractor;
pub mod server;
pub mod token;

pub use config::Settings;
pub use coordinator::{RefreshOutcome, UpdateCoordinator, UpdateCoordinatorGeneric};
pub use error::{Error, Result};
pub use extractor::{BrowserDriver, ExtractedTokens, SessionDriver};
pub use token::TokenRecord;
