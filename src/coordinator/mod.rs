//! Update coordination
//!
//! This module owns the cached token and the rules for when an extraction
//! attempt may run: at most one attempt in flight at any instant, forced
//! refresh requests merged into a single pending flag, and a periodic
//! schedule that keeps the cache fresh.

pub mod manager;
pub mod state;

pub use manager::{UpdateCoordinator, UpdateCoordinatorGeneric};
pub use state::{AttemptKind, CoordinatorState, RefreshOutcome};
