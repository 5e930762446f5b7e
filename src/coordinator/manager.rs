//! # Update Coordinator
//!
//! Owns the current [`TokenRecord`] and serializes extraction attempts.
//! Guarantees:
//!
//! - at most one attempt runs at any instant, no matter how many scheduled
//!   ticks or forced-refresh calls arrive concurrently;
//! - forced-refresh requests merge into a single pending flag;
//! - readers never wait on an in-progress attempt;
//! - a failed or panicked attempt can never leave the coordinator stuck
//!   in the in-flight state.
//!
//! The driver that performs the actual browser work is injected behind
//! [`SessionDriver`], with [`BrowserDriver`] as the default.
//!
//! # Examples
//!
//! ```rust
//! use potoken_provider::{RefreshOutcome, Settings, UpdateCoordinator};
//!
//! # tokio_test::block_on(async {
//! let coordinator = UpdateCoordinator::new(Settings::default());
//!
//! // Nothing captured yet, and reads never trigger an attempt
//! assert!(coordinator.read().is_none());
//!
//! // Refresh requests merge: one Accepted per burst
//! assert_eq!(coordinator.request_refresh(), RefreshOutcome::Accepted);
//! assert_eq!(coordinator.request_refresh(), RefreshOutcome::AlreadyPending);
//! # });
//! ```

use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::Settings;
use crate::coordinator::state::{AttemptKind, CoordinatorState, RefreshOutcome};
use crate::error::{Error, Result};
use crate::extractor::{BrowserDriver, SessionDriver};
use crate::token::TokenRecord;

/// Convenience alias for the coordinator with the default browser driver
pub type UpdateCoordinator = UpdateCoordinatorGeneric<BrowserDriver>;

/// Coordinator for token extraction attempts
#[derive(Debug)]
pub struct UpdateCoordinatorGeneric<D: SessionDriver = BrowserDriver> {
    /// Configuration settings
    settings: Arc<Settings>,
    /// Driver performing one extraction attempt
    driver: D,
    /// State machine guarding attempt begin/finish and refresh merging.
    /// Held only for transitions, never across an await.
    state: Mutex<CoordinatorState>,
    /// Last successful capture; replaced wholesale, never mutated
    current: RwLock<Option<TokenRecord>>,
    /// Stop signal for the periodic schedule
    shutdown_tx: watch::Sender<bool>,
}

impl UpdateCoordinatorGeneric<BrowserDriver> {
    /// Create a coordinator backed by the real browser driver
    pub fn new(settings: Settings) -> Self {
        let driver = BrowserDriver::new(settings.extractor.clone());
        Self::new_with_driver(settings, driver)
    }
}

impl<D> UpdateCoordinatorGeneric<D>
where
    D: SessionDriver,
{
    /// Create a coordinator with a custom driver implementation
    pub fn new_with_driver(settings: Settings, driver: D) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            settings: Arc::new(settings),
            driver,
            state: Mutex::new(CoordinatorState::Idle),
            current: RwLock::new(None),
            shutdown_tx,
        }
    }

    /// Current cached record, if any.
    ///
    /// Never suspends and never triggers an attempt; returns whatever the
    /// last successful extraction produced, however stale.
    pub fn read(&self) -> Option<TokenRecord> {
        self.current
            .read()
            .expect("token cache lock poisoned")
            .clone()
    }

    /// Request an update ahead of the next scheduled tick.
    ///
    /// Returns [`RefreshOutcome::Accepted`] for the first request of a
    /// burst; every other caller gets [`RefreshOutcome::AlreadyPending`]
    /// and will be served by the same attempt.
    pub fn request_refresh(&self) -> RefreshOutcome {
        let mut state = self.state.lock().expect("coordinator state lock poisoned");
        let before = *state;
        let outcome = state.request_refresh();
        drop(state);

        match outcome {
            RefreshOutcome::Accepted => tracing::info!("Forced update requested"),
            RefreshOutcome::AlreadyPending if before.is_in_flight() => {
                tracing::debug!("Update process is already running");
            }
            RefreshOutcome::AlreadyPending => {
                tracing::debug!("Forced update has already been requested");
            }
        }
        outcome
    }

    /// Run exactly one extraction attempt and wait for its outcome.
    ///
    /// Fails with [`Error::AttemptInProgress`] when another attempt holds
    /// the single-flight slot; the caller can `read()` once that attempt
    /// completes.
    pub async fn run_once(&self) -> Result<TokenRecord> {
        match self.try_begin() {
            Some(_) => self.perform_attempt().await,
            None => Err(Error::AttemptInProgress),
        }
    }

    /// Drive the periodic schedule until [`stop`](Self::stop) is called.
    ///
    /// The first tick fires immediately, then once per configured interval.
    /// A tick whose attempt fails logs and keeps the schedule alive; a tick
    /// arriving while an attempt is still running is skipped (the
    /// single-flight gate holds for the schedule too).
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut ticks = tokio::time::interval(self.settings.extractor.update_interval());
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut first_attempt = true;

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticks.tick() => {
                    match self.try_begin() {
                        Some(AttemptKind::Forced) => tracing::info!("Initiating forced update"),
                        Some(AttemptKind::Scheduled) => tracing::info!("Initiating scheduled update"),
                        None => {
                            tracing::debug!("Update is already in progress, skipping tick");
                            continue;
                        }
                    }
                    if let Err(e) = self.perform_attempt().await {
                        tracing::warn!("Token update failed: {e}");
                    }
                    if first_attempt {
                        first_attempt = false;
                        if self.read().is_none() {
                            tracing::warn!("Failed to generate initial token");
                        }
                    }
                }
            }
        }
        tracing::info!("Update schedule stopped");
    }

    /// Cancel future scheduled ticks.
    ///
    /// An attempt already delegated to the driver is left to finish
    /// naturally; its own bounded wait is the only cancellation it has.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Claim the single-flight slot, consuming a pending refresh if one is
    /// queued
    fn try_begin(&self) -> Option<AttemptKind> {
        self.state
            .lock()
            .expect("coordinator state lock poisoned")
            .begin_attempt()
    }

    /// One full attempt. The caller must have claimed the in-flight slot;
    /// the guard releases it on every exit path, panics included.
    async fn perform_attempt(&self) -> Result<TokenRecord> {
        let _guard = InFlightGuard { state: &self.state };
        tracing::info!("Update started");

        match self.driver.extract_once().await {
            Ok(tokens) => {
                let record = TokenRecord::new(tokens.po_token, tokens.visitor_data);
                if !record.is_plausible() {
                    // Cached anyway: a suspect token beats serving nothing.
                    tracing::warn!(
                        "Captured token is only {} characters and may not be trusted",
                        record.po_token.len()
                    );
                }
                tracing::info!(
                    "New token captured ({} chars, visitor data {} chars)",
                    record.po_token.len(),
                    record.visitor_data.len()
                );
                *self.current.write().expect("token cache lock poisoned") = Some(record.clone());
                Ok(record)
            }
            Err(e) => {
                match &e {
                    Error::ExtractionTimeout { .. } => {
                        tracing::warn!("Timeout waiting for outgoing API request")
                    }
                    _ => tracing::error!("Update failed: {e}"),
                }
                Err(e)
            }
        }
    }
}

/// Releases the single-flight slot when an attempt ends, however it ends
struct InFlightGuard<'a> {
    state: &'a Mutex<CoordinatorState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .finish_attempt();
    }
}
