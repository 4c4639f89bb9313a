//! # Access Ledger Testing
//!
//! Testing utilities and helpers for the Access Ledger architecture.
//!
//! This crate provides:
//! - Deterministic clocks for the environment
//! - An event log that refuses appends, at once or after a quota
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use access_ledger_testing::{ManualClock, ReducerTest};
//!
//! let clock = ManualClock::at_timestamp(1_000);
//! ReducerTest::new(AccessRequestReducer)
//!     .with_env(AccessRequestEnvironment::new(Arc::new(clock)))
//!     .given_state(AccessRequestState::default())
//!     .when_action(create_command())
//!     .then_state(|state| assert_eq!(state.request_count(), 1))
//!     .run();
//! ```

use access_ledger_core::environment::Clock;
use chrono::{DateTime, Utc};


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use access_ledger_core::event::SerializedEvent;
    use access_ledger_core::event_log::{EventLog, EventLogError, LoggedEvent, Position};
    use chrono::TimeDelta;
    use std::future::{Future, ready};
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use access_ledger_testing::mocks::FixedClock;
    /// use access_ledger_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }

    /// Clock that only moves when a test moves it.
    ///
    /// Clones share the same instant, so a test can keep one handle and give
    /// another to the environment.
    ///
    /// # Example
    ///
    /// ```
    /// use access_ledger_testing::mocks::ManualClock;
    /// use access_ledger_core::environment::Clock;
    ///
    /// let clock = ManualClock::at_timestamp(1_000);
    /// let handle = clock.clone();
    /// handle.advance_secs(3_600);
    /// assert_eq!(clock.now().timestamp(), 4_600);
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Start at the given instant
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Start at a Unix timestamp in seconds (out-of-range values clamp to the epoch)
        #[must_use]
        pub fn at_timestamp(secs: i64) -> Self {
            Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
        }

        /// Jump to an instant
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }

        /// Jump to a Unix timestamp in seconds
        pub fn set_timestamp(&self, secs: i64) {
            self.set(DateTime::from_timestamp(secs, 0).unwrap_or_default());
        }

        /// Move forward by `secs` seconds, saturating at the calendar limit
        pub fn advance_secs(&self, secs: i64) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            let delta = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX);
            *time = time.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Event log that rejects appends and every read.
    ///
    /// Used to exercise the error path of stores whose environment loses its
    /// event log. With [`after`](Self::after) the first appends succeed, so a
    /// multi-event action fails part way through.
    #[derive(Debug, Clone)]
    pub struct FailingEventLog {
        reason: String,
        quota: u64,
        accepted: Arc<AtomicU64>,
    }

    impl FailingEventLog {
        /// Fail every operation with `reason`
        #[must_use]
        pub fn new(reason: impl Into<String>) -> Self {
            Self::after(0, reason)
        }

        /// Accept the first `quota` appends, then fail with `reason`
        #[must_use]
        pub fn after(quota: u64, reason: impl Into<String>) -> Self {
            Self {
                reason: reason.into(),
                quota,
                accepted: Arc::new(AtomicU64::new(0)),
            }
        }

        /// Number of appends accepted so far
        #[must_use]
        pub fn accepted(&self) -> u64 {
            self.accepted.load(Ordering::SeqCst)
        }
    }

    impl EventLog for FailingEventLog {
        fn append(
            &self,
            event: SerializedEvent,
        ) -> Pin<Box<dyn Future<Output = Result<Position, EventLogError>> + Send + '_>> {
            let quota = self.quota;
            let taken = self
                .accepted
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < quota).then_some(n + 1)
                });

            Box::pin(ready(match taken {
                Ok(offset) => Ok(Position::new(offset)),
                Err(_) => Err(EventLogError::AppendFailed {
                    event_type: event.event_type,
                    reason: self.reason.clone(),
                }),
            }))
        }

        fn read_from(
            &self,
            position: Position,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<LoggedEvent>, EventLogError>> + Send + '_>>
        {
            Box::pin(ready(Err(EventLogError::ReadFailed {
                position,
                reason: self.reason.clone(),
            })))
        }
    }
}

// Re-export commonly used items
pub use mocks::{FailingEventLog, FixedClock, ManualClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use access_ledger_core::event::SerializedEvent;
    use access_ledger_core::event_log::{EventLog, EventLogError, Position};

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().timestamp(), 1_735_689_600);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::at_timestamp(1_000);
        let handle = clock.clone();

        handle.advance_secs(500);
        assert_eq!(clock.now().timestamp(), 1_500);

        handle.set_timestamp(10);
        assert_eq!(clock.now().timestamp(), 10);
    }

    #[test]
    fn manual_clock_saturates() {
        let clock = ManualClock::at_timestamp(0);
        clock.advance_secs(i64::MAX);
        assert_eq!(clock.now(), DateTime::<Utc>::MAX_UTC);
    }

    #[tokio::test]
    async fn failing_log_rejects_everything() {
        let log = FailingEventLog::new("offline");

        let append = log
            .append(SerializedEvent::new("X.v1".to_string(), Vec::new(), None))
            .await;
        let read = log.read_from(Position::START).await;

        assert!(matches!(
            append,
            Err(EventLogError::AppendFailed { ref event_type, .. }) if event_type == "X.v1"
        ));
        assert!(matches!(read, Err(EventLogError::ReadFailed { .. })));
        assert_eq!(log.accepted(), 0);
    }

    #[tokio::test]
    async fn failing_log_honours_quota() {
        let log = FailingEventLog::after(2, "full");
        let event = || SerializedEvent::new("X.v1".to_string(), Vec::new(), None);

        assert_eq!(log.append(event()).await.unwrap(), Position::new(0));
        assert_eq!(log.append(event()).await.unwrap(), Position::new(1));
        assert!(log.append(event()).await.is_err());
        assert_eq!(log.accepted(), 2);
    }
}
