//! The geolocation lookup state machine.
//!
//! `Idle -> Requesting -> {Resolved, Failed, TimedOut} -> Done`
//!
//! A lookup runs once and always ends with exactly one [`LookupOutcome`]:
//! either a place name, or the error that sent it down the fallback path.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::geocode::Geocoder;
use crate::location::PositionProvider;
use crate::types::{LookupError, PlaceName, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Requesting,
    Resolved,
    Failed,
    TimedOut,
    Done,
}

impl LookupState {
    pub fn can_transition_to(self, next: LookupState) -> bool {
        use LookupState::*;
        matches!(
            (self, next),
            (Idle, Requesting)
                | (Idle, Failed)
                | (Requesting, Resolved)
                | (Requesting, Failed)
                | (Requesting, TimedOut)
                | (Resolved, Done)
                | (Failed, Done)
                | (TimedOut, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == LookupState::Done
    }
}

/// What the page view does next: add a city, or fall back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Resolved(PlaceName),
    Fallback(LookupError),
}

impl LookupOutcome {
    pub fn place(&self) -> Option<&PlaceName> {
        match self {
            Self::Resolved(place) => Some(place),
            Self::Fallback(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Result of a finished lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupReport {
    pub outcome: LookupOutcome,
    /// The state reached just before `Done`
    pub settled: LookupState,
}

pub struct GeolocationLookup<P, G> {
    provider: P,
    geocoder: G,
    timeout: Option<Duration>,
    state: LookupState,
}

impl<P: PositionProvider, G: Geocoder> GeolocationLookup<P, G> {
    /// `timeout` bounds the geocode request only; `None` waits indefinitely.
    pub fn new(provider: P, geocoder: G, timeout: Option<Duration>) -> Self {
        Self {
            provider,
            geocoder,
            timeout,
            state: LookupState::Idle,
        }
    }

    pub fn state(&self) -> LookupState {
        self.state
    }

    /// Run the lookup to completion. Consumes the lookup: one run per page view.
    pub async fn run(mut self) -> LookupReport {
        let outcome = match self.locate().await {
            Ok(place) => {
                self.transition(LookupState::Resolved);
                LookupOutcome::Resolved(place)
            }
            Err(LookupError::Timeout) => {
                self.transition(LookupState::TimedOut);
                LookupOutcome::Fallback(LookupError::Timeout)
            }
            Err(e) => {
                self.transition(LookupState::Failed);
                LookupOutcome::Fallback(e)
            }
        };

        let settled = self.state;
        self.transition(LookupState::Done);

        match &outcome {
            LookupOutcome::Resolved(place) => {
                tracing::info!("Location lookup resolved: {}", place.city())
            }
            LookupOutcome::Fallback(e) if e.is_position_failure() => {
                tracing::info!("No position, skipping geocode: {}", e)
            }
            LookupOutcome::Fallback(e) => {
                tracing::info!("Location lookup fell back: {}", e)
            }
        }

        LookupReport { outcome, settled }
    }

    async fn locate(&mut self) -> Result<PlaceName, LookupError> {
        if !self.provider.is_available() {
            return Err(LookupError::CapabilityUnavailable);
        }
        self.transition(LookupState::Requesting);

        let position = self.provider.current_position().await.map_err(|e| {
            tracing::debug!("Position request failed: {}", e);
            e
        })?;
        tracing::debug!("Got position {}", position);

        self.geocode_with_deadline(position).await
    }

    /// Race the geocoder against a cancellation token armed with the timeout.
    ///
    /// Losing the race drops the geocode future, so a late response is never
    /// observed.
    async fn geocode_with_deadline(&self, position: Position) -> Result<PlaceName, LookupError> {
        let token = CancellationToken::new();
        // Cancelling on every exit also stops the timer task
        let _disarm = token.clone().drop_guard();

        if let Some(timeout) = self.timeout {
            let armed = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        tracing::debug!("Geocode timeout of {:?} elapsed", timeout);
                        armed.cancel();
                    }
                    _ = armed.cancelled() => {}
                }
            });
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(LookupError::Timeout),
            result = self.geocoder.reverse(position) => result,
        }
    }

    fn transition(&mut self, next: LookupState) -> bool {
        if self.state.can_transition_to(next) {
            tracing::trace!("Lookup {:?} -> {:?}", self.state, next);
            self.state = next;
            true
        } else {
            tracing::warn!("Ignoring invalid lookup transition {:?} -> {:?}", self.state, next);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FixedPosition, Unavailable};
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Denied;

    impl PositionProvider for Denied {
        fn is_available(&self) -> bool {
            true
        }

        async fn current_position(&self) -> Result<Position, LookupError> {
            Err(LookupError::PermissionDenied)
        }
    }

    /// Answers after `delay`, counting calls and delivered responses
    struct SlowGeocoder {
        delay: Duration,
        answer: Result<PlaceName, LookupError>,
        calls: Arc<AtomicUsize>,
        delivered: Arc<AtomicUsize>,
    }

    impl SlowGeocoder {
        fn new(delay: Duration, answer: Result<PlaceName, LookupError>) -> Self {
            Self {
                delay,
                answer,
                calls: Arc::new(AtomicUsize::new(0)),
                delivered: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Geocoder for SlowGeocoder {
        fn reverse(
            &self,
            _position: Position,
        ) -> impl Future<Output = Result<PlaceName, LookupError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            let answer = self.answer.clone();
            let delivered = self.delivered.clone();
            async move {
                tokio::time::sleep(delay).await;
                delivered.fetch_add(1, Ordering::SeqCst);
                answer
            }
        }
    }

    fn san_francisco() -> PlaceName {
        PlaceName::new(Some("San Francisco".into()), Some("CA".into())).unwrap()
    }

    fn here() -> FixedPosition {
        FixedPosition(Position::new(37.77, -122.42))
    }

    #[test]
    fn test_valid_transitions() {
        use LookupState::*;
        assert!(Idle.can_transition_to(Requesting));
        assert!(Idle.can_transition_to(Failed));
        assert!(Requesting.can_transition_to(TimedOut));
        assert!(TimedOut.can_transition_to(Done));
    }

    #[test]
    fn test_invalid_transitions() {
        use LookupState::*;
        assert!(!Idle.can_transition_to(Resolved));
        assert!(!Idle.can_transition_to(Done));
        assert!(!Resolved.can_transition_to(Failed));
        assert!(!TimedOut.can_transition_to(Resolved));
        assert!(!Done.can_transition_to(Requesting));
        assert!(Done.is_terminal());
    }

    #[test]
    fn test_new_lookup_is_idle() {
        let lookup = GeolocationLookup::new(
            Unavailable,
            SlowGeocoder::new(Duration::ZERO, Ok(san_francisco())),
            None,
        );
        assert_eq!(lookup.state(), LookupState::Idle);
    }

    #[tokio::test]
    async fn test_capability_absent_skips_geocoder() {
        let geocoder = SlowGeocoder::new(Duration::ZERO, Ok(san_francisco()));
        let calls = geocoder.calls.clone();

        let report = GeolocationLookup::new(Unavailable, geocoder, None).run().await;

        assert_eq!(
            report.outcome,
            LookupOutcome::Fallback(LookupError::CapabilityUnavailable)
        );
        assert_eq!(report.settled, LookupState::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_permission_denied_falls_back() {
        let geocoder = SlowGeocoder::new(Duration::ZERO, Ok(san_francisco()));
        let calls = geocoder.calls.clone();

        let report = GeolocationLookup::new(Denied, geocoder, None).run().await;

        assert_eq!(report.outcome, LookupOutcome::Fallback(LookupError::PermissionDenied));
        assert_eq!(report.settled, LookupState::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_geocode_success_within_timeout() {
        let geocoder = SlowGeocoder::new(Duration::from_millis(500), Ok(san_francisco()));

        let report = GeolocationLookup::new(here(), geocoder, Some(Duration::from_millis(4000)))
            .run()
            .await;

        assert_eq!(report.outcome, LookupOutcome::Resolved(san_francisco()));
        assert_eq!(report.settled, LookupState::Resolved);
    }

    #[tokio::test]
    async fn test_geocode_error_falls_back() {
        let geocoder = SlowGeocoder::new(Duration::ZERO, Err(LookupError::Status(503)));

        let report = GeolocationLookup::new(here(), geocoder, Some(Duration::from_secs(4)))
            .run()
            .await;

        assert_eq!(report.outcome, LookupOutcome::Fallback(LookupError::Status(503)));
        assert_eq!(report.settled, LookupState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_geocoder_times_out_and_late_response_is_dropped() {
        let geocoder = SlowGeocoder::new(Duration::from_millis(6000), Ok(san_francisco()));
        let calls = geocoder.calls.clone();
        let delivered = geocoder.delivered.clone();

        let report = GeolocationLookup::new(here(), geocoder, Some(Duration::from_millis(4000)))
            .run()
            .await;

        assert_eq!(report.outcome, LookupOutcome::Fallback(LookupError::Timeout));
        assert_eq!(report.settled, LookupState::TimedOut);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Let the geocoder deadline pass; the dropped future never completes
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_lookup_waits_for_slow_geocoder() {
        let geocoder = SlowGeocoder::new(Duration::from_secs(60), Ok(san_francisco()));

        let report = GeolocationLookup::new(here(), geocoder, None).run().await;

        assert_eq!(report.outcome, LookupOutcome::Resolved(san_francisco()));
    }
}
