//! # Access Ledger Runtime
//!
//! Runtime implementation for the Access Ledger architecture.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, runs the reducer under a write lock and publishes
//!   the resulting events before releasing it
//! - **`InMemoryEventLog`**: Process-local append-only log with subscriptions
//!
//! ## Example
//!
//! ```ignore
//! use access_ledger_runtime::{InMemoryEventLog, Store};
//! use std::sync::Arc;
//!
//! let store = Store::new(initial_state, reducer, environment, Arc::new(InMemoryEventLog::new()));
//!
//! // Send an action; the published events come back in order
//! let events = store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

/// In-memory event log
pub mod event_log;

pub use event_log::InMemoryEventLog;

/// Error types for the Store runtime
pub mod error {
    use access_ledger_core::event::EventError;
    use access_ledger_core::event_log::EventLogError;
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// `E` is the reducer's rejection type.
    #[derive(Error, Debug)]
    pub enum StoreError<E> {
        /// The reducer rejected the action; state is unchanged
        #[error("Action rejected: {0}")]
        Rejected(E),

        /// A published event could not be serialized, or a logged event
        /// could not be decoded during replay
        #[error("Event serialization failed: {0}")]
        Serialization(#[from] EventError),

        /// The event log refused an append or a read
        #[error("Event log failure: {0}")]
        EventLog(#[from] EventLogError),
    }
}

pub use error::StoreError;

/// The Store - runtime coordinator for a reducer
pub mod store {
    use super::StoreError;
    use access_ledger_core::effect;
    use access_ledger_core::event::{Event, SerializedEvent};
    use access_ledger_core::event_log::{EventLog, Position};
    use access_ledger_core::reducer::Reducer;
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use std::fmt::Display;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Event publication to the event log
    ///
    /// # Atomicity
    ///
    /// `send()` holds the write lock while the reducer runs and while every
    /// event it produced is appended to the log. Readers therefore never see
    /// a half-applied action, and events from concurrent callers never
    /// interleave.
    ///
    /// The reducer's state change is committed before anything is appended.
    /// If an append fails, `send()` returns the error but keeps that change,
    /// and the events already appended for the same action stay in the log.
    /// A batch action can therefore be partially published.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        event_log: Arc<dyn EventLog>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        R::Error: Display,
        A: Event + Serialize + Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, environment and event log
        #[must_use]
        pub fn new(
            initial_state: S,
            reducer: R,
            environment: E,
            event_log: Arc<dyn EventLog>,
        ) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                event_log,
            }
        }

        /// Rebuild a store by feeding every logged event back through the reducer.
        ///
        /// Effects returned during replay are discarded: the events are
        /// already in the log.
        ///
        /// # Errors
        ///
        /// - [`StoreError::EventLog`] if the log cannot be read
        /// - [`StoreError::Serialization`] if a logged event does not decode as `A`
        /// - [`StoreError::Rejected`] if the reducer refuses a logged event
        pub async fn replay(
            initial_state: S,
            reducer: R,
            environment: E,
            event_log: Arc<dyn EventLog>,
        ) -> Result<Self, StoreError<R::Error>>
        where
            A: DeserializeOwned,
        {
            let mut state = initial_state;
            let logged = event_log.read_from(Position::START).await?;

            for entry in &logged {
                let action: A = entry.event.decode()?;
                reducer
                    .reduce(&mut state, action, &environment)
                    .map_err(StoreError::Rejected)?;
            }

            tracing::info!(events = logged.len(), "Store rebuilt from event log");
            Ok(Self::new(state, reducer, environment, event_log))
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Appends every published event to the event log, in order
        /// 4. Releases the lock
        ///
        /// # Returns
        ///
        /// The events that were published, in publication order.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Rejected`] if the reducer rejects the action (nothing changed)
        /// - [`StoreError::Serialization`] / [`StoreError::EventLog`] if publication
        ///   fails. The state change is not rolled back, and events appended
        ///   before the failure stay in the log while later ones are never
        ///   appended.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<Vec<A>, StoreError<R::Error>> {
            let mut state = self.state.write().await;

            let effects = match self
                .reducer
                .reduce(&mut *state, action, self.environment.as_ref())
            {
                Ok(effects) => effects,
                Err(error) => {
                    metrics::counter!("store.actions.rejected").increment(1);
                    tracing::debug!(%error, "Action rejected by reducer");
                    return Err(StoreError::Rejected(error));
                },
            };
            metrics::counter!("store.actions.processed").increment(1);

            let events = effect::published(effects);
            for event in &events {
                let serialized = SerializedEvent::from_event(event)?;
                let event_type = serialized.event_type.clone();
                let position = self.event_log.append(serialized).await?;

                metrics::counter!("store.events.published", "event_type" => event_type.clone())
                    .increment(1);
                tracing::debug!(%event_type, %position, "Event published");
            }

            drop(state);
            Ok(events)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Access the injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// The event log this store publishes to
        #[must_use]
        pub fn event_log(&self) -> Arc<dyn EventLog> {
            Arc::clone(&self.event_log)
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                event_log: Arc::clone(&self.event_log),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use access_ledger_core::effect::{Effect, Effects};
    use access_ledger_core::event::Event;
    use access_ledger_core::event_log::EventLog;
    use access_ledger_core::reducer::Reducer;
    use access_ledger_core::smallvec;
    use access_ledger_testing::FailingEventLog;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Clone, Debug, Default)]
    struct TallyState {
        total: u32,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    enum TallyAction {
        Add { amount: u32 },
        AddPair { first: u32, second: u32 },
        Added { amount: u32 },
    }

    impl Event for TallyAction {
        fn event_type(&self) -> &'static str {
            match self {
                TallyAction::Add { .. } => "Add.command",
                TallyAction::AddPair { .. } => "AddPair.command",
                TallyAction::Added { .. } => "Added.v1",
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("amount must be positive")]
    struct ZeroAmount;

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = TallyState;
        type Action = TallyAction;
        type Environment = ();
        type Error = ZeroAmount;

        fn reduce(
            &self,
            state: &mut TallyState,
            action: TallyAction,
            _env: &(),
        ) -> Result<Effects<TallyAction>, ZeroAmount> {
            match action {
                TallyAction::Add { amount } => {
                    if amount == 0 {
                        return Err(ZeroAmount);
                    }
                    state.total += amount;
                    Ok(smallvec![Effect::PublishEvent(TallyAction::Added { amount })])
                },
                TallyAction::AddPair { first, second } => {
                    state.total += first + second;
                    Ok(smallvec![
                        Effect::PublishEvent(TallyAction::Added { amount: first }),
                        Effect::PublishEvent(TallyAction::Added { amount: second }),
                    ])
                },
                TallyAction::Added { amount } => {
                    state.total += amount;
                    Ok(Effects::new())
                },
            }
        }
    }

    fn tally_store(log: Arc<dyn EventLog>) -> Store<TallyState, TallyAction, (), TallyReducer> {
        Store::new(TallyState::default(), TallyReducer, (), log)
    }

    #[tokio::test]
    async fn send_applies_and_publishes() {
        let log = Arc::new(InMemoryEventLog::new());
        let store = tally_store(log.clone());

        let events = store.send(TallyAction::Add { amount: 3 }).await.unwrap();

        assert_eq!(events, vec![TallyAction::Added { amount: 3 }]);
        assert_eq!(store.state(|s| s.total).await, 3);
        assert_eq!(log.event_types(), vec!["Added.v1"]);
    }

    #[tokio::test]
    async fn rejected_action_changes_nothing() {
        let log = Arc::new(InMemoryEventLog::new());
        let store = tally_store(log.clone());

        let result = store.send(TallyAction::Add { amount: 0 }).await;

        assert!(matches!(result, Err(StoreError::Rejected(ZeroAmount))));
        assert_eq!(store.state(|s| s.total).await, 0);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn replay_rebuilds_state_from_log() {
        let log = Arc::new(InMemoryEventLog::new());
        let store = tally_store(log.clone());
        store.send(TallyAction::Add { amount: 2 }).await.unwrap();
        store.send(TallyAction::Add { amount: 5 }).await.unwrap();

        let rebuilt = Store::replay(TallyState::default(), TallyReducer, (), log.clone())
            .await
            .unwrap();

        assert_eq!(rebuilt.state(|s| s.total).await, 7);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn failing_log_surfaces_as_event_log_error() {
        let store = tally_store(Arc::new(FailingEventLog::new("log offline")));

        let result = store.send(TallyAction::Add { amount: 1 }).await;

        assert!(matches!(result, Err(StoreError::EventLog(_))));
        assert_eq!(store.state(|s| s.total).await, 1);
    }

    #[tokio::test]
    async fn append_failure_mid_action_keeps_earlier_events() {
        let log = FailingEventLog::after(1, "log full");
        let store = tally_store(Arc::new(log.clone()));

        let result = store.send(TallyAction::AddPair { first: 2, second: 3 }).await;

        assert!(matches!(result, Err(StoreError::EventLog(_))));
        assert_eq!(store.state(|s| s.total).await, 5);
        assert_eq!(log.accepted(), 1);
    }

    #[tokio::test]
    async fn concurrent_sends_serialize() {
        let store = tally_store(Arc::new(InMemoryEventLog::new()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.send(TallyAction::Add { amount: 1 }).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.state(|s| s.total).await, 10);
    }
}
