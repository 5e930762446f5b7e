//! Coordinator state machine
//!
//! A single enum replaces separate `is_updating`/`update_requested` flags so
//! the two can never be observed inconsistently. All transitions happen
//! through the methods below, each returning what the caller needs to know.

/// Lifecycle of the update coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// No attempt running, no refresh queued
    #[default]
    Idle,
    /// A forced refresh is queued for the next attempt to start
    RefreshPending,
    /// An extraction attempt is currently running
    InFlight,
}

/// Caller-visible outcome of a refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The request was recorded; the next attempt will serve it
    Accepted,
    /// An attempt is running or a refresh is already queued
    AlreadyPending,
}

/// How an attempt that just began should be classified in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    /// Regular tick of the periodic schedule
    Scheduled,
    /// A queued forced-refresh request was consumed
    Forced,
}

impl CoordinatorState {
    /// Record a forced-refresh request.
    ///
    /// The pending flag is boolean, not a counter: any number of requests
    /// before the next attempt collapse into one.
    pub fn request_refresh(&mut self) -> RefreshOutcome {
        match self {
            Self::Idle => {
                *self = Self::RefreshPending;
                RefreshOutcome::Accepted
            }
            Self::RefreshPending | Self::InFlight => RefreshOutcome::AlreadyPending,
        }
    }

    /// Try to begin an attempt.
    ///
    /// Returns `None` while another attempt is in flight (single-flight
    /// gate). A queued refresh is consumed here and only affects the
    /// returned classification, not whether the attempt runs.
    pub fn begin_attempt(&mut self) -> Option<AttemptKind> {
        match self {
            Self::Idle => {
                *self = Self::InFlight;
                Some(AttemptKind::Scheduled)
            }
            Self::RefreshPending => {
                *self = Self::InFlight;
                Some(AttemptKind::Forced)
            }
            Self::InFlight => None,
        }
    }

    /// Mark the running attempt as finished, whatever its outcome
    pub fn finish_attempt(&mut self) {
        if matches!(self, Self::InFlight) {
            *self = Self::Idle;
        }
    }

    /// Whether an attempt is currently running
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_from_idle_is_accepted_once() {
        let mut state = CoordinatorState::Idle;

        assert_eq!(state.request_refresh(), RefreshOutcome::Accepted);
        assert_eq!(state, CoordinatorState::RefreshPending);

        // Subsequent requests merge into the one already queued
        assert_eq!(state.request_refresh(), RefreshOutcome::AlreadyPending);
        assert_eq!(state.request_refresh(), RefreshOutcome::AlreadyPending);
        assert_eq!(state, CoordinatorState::RefreshPending);
    }

    #[test]
    fn test_refresh_while_in_flight_does_not_queue() {
        let mut state = CoordinatorState::Idle;
        assert_eq!(state.begin_attempt(), Some(AttemptKind::Scheduled));

        assert_eq!(state.request_refresh(), RefreshOutcome::AlreadyPending);

        // The running attempt satisfies the request; once it finishes the
        // next tick is an ordinary scheduled one.
        state.finish_attempt();
        assert_eq!(state.begin_attempt(), Some(AttemptKind::Scheduled));
    }

    #[test]
    fn test_begin_consumes_pending_refresh() {
        let mut state = CoordinatorState::Idle;
        assert_eq!(state.request_refresh(), RefreshOutcome::Accepted);

        assert_eq!(state.begin_attempt(), Some(AttemptKind::Forced));
        assert!(state.is_in_flight());

        state.finish_attempt();
        assert_eq!(state, CoordinatorState::Idle);
    }

    #[test]
    fn test_single_flight_gate() {
        let mut state = CoordinatorState::Idle;
        assert!(state.begin_attempt().is_some());

        // No second attempt may begin until the first one finishes
        assert_eq!(state.begin_attempt(), None);
        assert_eq!(state.begin_attempt(), None);

        state.finish_attempt();
        assert!(state.begin_attempt().is_some());
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut state = CoordinatorState::Idle;
        state.finish_attempt();
        assert_eq!(state, CoordinatorState::Idle);

        // A pending refresh survives a stray finish call
        state.request_refresh();
        state.finish_attempt();
        assert_eq!(state, CoordinatorState::RefreshPending);
    }

    #[test]
    fn test_refresh_after_attempt_finishes_is_accepted_again() {
        let mut state = CoordinatorState::Idle;
        state.begin_attempt();
        assert_eq!(state.request_refresh(), RefreshOutcome::AlreadyPending);

        state.finish_attempt();
        assert_eq!(state.request_refresh(), RefreshOutcome::Accepted);
    }
}
