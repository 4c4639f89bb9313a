//! # Access Ledger Core
//!
//! Core traits and types for the Access Ledger architecture.
//!
//! Business rules live in a [`reducer::Reducer`]: a function
//! `(State, Action, Environment) → Result<Effects, Error>` that validates a
//! command, mutates state in place and describes the domain events that must
//! be published once the mutation is committed.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state owned by a single store
//! - **Action**: All possible inputs to a reducer (commands and events)
//! - **Reducer**: Validates, then applies; never mutates on rejection
//! - **Effect**: Description of an event to publish (not its execution)
//! - **Environment**: Injected dependencies such as the [`environment::Clock`]
//! - **Event log**: Append-only channel receiving published events
//!
//! ## Example
//!
//! ```ignore
//! use access_ledger_core::*;
//!
//! impl Reducer for LedgerReducer {
//!     type State = LedgerState;
//!     type Action = LedgerAction;
//!     type Environment = LedgerEnvironment;
//!     type Error = LedgerError;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut LedgerState,
//!         action: LedgerAction,
//!         env: &LedgerEnvironment,
//!     ) -> Result<Effects<LedgerAction>, LedgerError> {
//!         // Validate first, then apply
//!         Ok(SmallVec::new())
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Event trait and serialized event wire format
pub mod event;

/// Append-only event log abstraction
pub mod event_log;

/// Reducer module - The core trait for business logic
///
/// Reducers are deterministic: `(State, Action, Environment) → (State, Effects)`.
/// A rejected action returns an error and leaves state untouched.
pub mod reducer {
    use super::effect::Effects;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Error`: Why an action was rejected
    ///
    /// # Contract
    ///
    /// Implementations validate the whole action before touching `state`.
    /// When `reduce` returns `Err`, `state` must be exactly as it was before
    /// the call, and no effects are produced.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The rejection type returned for invalid actions
        type Error;

        /// Reduce an action into state changes and effects
        ///
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed after commit
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the action is rejected. State is untouched.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Effects<Self::Action>, Self::Error>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values returned by reducers. The store executes them after the
/// reducer has committed its state change.
pub mod effect {
    use smallvec::SmallVec;

    /// Inline capacity chosen so single-record commands never allocate.
    pub type Effects<Action> = SmallVec<[Effect<Action>; 4]>;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type carried by published events
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects one after another, in order
        Sequential(Vec<Effect<Action>>),

        /// Append a domain event to the event log
        PublishEvent(Action),
    }

    impl<Action> Effect<Action> {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Flatten this effect into the events it publishes, in program order.
        pub fn into_published(self, out: &mut Vec<Action>) {
            match self {
                Effect::None => {},
                Effect::Sequential(effects) => {
                    for effect in effects {
                        effect.into_published(out);
                    }
                },
                Effect::PublishEvent(action) => out.push(action),
            }
        }
    }

    /// Collect every event published by a list of effects, preserving order.
    #[must_use]
    pub fn published<Action>(effects: impl IntoIterator<Item = Effect<Action>>) -> Vec<Action> {
        let mut out = Vec::new();
        for effect in effects {
            effect.into_published(&mut out);
        }
        out
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use access_ledger_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

pub use effect::{Effect, Effects};
pub use reducer::Reducer;
