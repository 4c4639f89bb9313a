//! Append-only event log abstraction.
//!
//! The event log is the externally observable record of every state
//! transition. Stores append to it after a reducer has committed a change,
//! and read it back from the start to rebuild state.
//!
//! # Example
//!
//! ```rust,ignore
//! use access_ledger_core::event::SerializedEvent;
//! use access_ledger_core::event_log::{EventLog, Position};
//!
//! async fn example(log: impl EventLog) -> Result<(), Box<dyn std::error::Error>> {
//!     let event = SerializedEvent::new("RequestApproved.v1".to_string(), vec![1, 2, 3], None);
//!     let position = log.append(event).await?;
//!
//!     let everything = log.read_from(Position::START).await?;
//!     assert_eq!(everything.last().map(|e| e.position), Some(position));
//!     Ok(())
//! }
//! ```

use crate::event::SerializedEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event log operations.
#[derive(Error, Debug, Clone)]
pub enum EventLogError {
    /// Failed to append an event
    #[error("Append failed for event '{event_type}': {reason}")]
    AppendFailed {
        /// The event type that could not be appended
        event_type: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to read the log
    #[error("Read failed from position {position}: {reason}")]
    ReadFailed {
        /// Position the read started at
        position: Position,
        /// The reason for failure
        reason: String,
    },
}

/// Zero-based position of an event in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(u64);

impl Position {
    /// The first position of every log.
    pub const START: Self = Self(0);

    /// Create a position from a raw offset.
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self(offset)
    }

    /// Raw offset of this position.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.0
    }

    /// The position after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event together with the position it was appended at.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    /// Where the event sits in the log
    pub position: Position,
    /// The serialized event
    pub event: SerializedEvent,
}

/// Trait for append-only event log implementations.
///
/// # Ordering
///
/// Events are assigned strictly increasing positions in append order.
/// Nothing is ever removed or rewritten.
///
/// # Dyn Compatibility
///
/// Uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn` so the
/// log can be shared as `Arc<dyn EventLog>`.
pub trait EventLog: Send + Sync {
    /// Append an event and return the position it was stored at.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::AppendFailed`] if the event was not stored.
    fn append(
        &self,
        event: SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<Position, EventLogError>> + Send + '_>>;

    /// Read every event stored at or after `position`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::ReadFailed`] if the log cannot be read.
    fn read_from(
        &self,
        position: Position,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LoggedEvent>, EventLogError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_advance_by_one() {
        let start = Position::START;
        assert_eq!(start.offset(), 0);
        assert_eq!(start.next(), Position::new(1));
        assert!(start < start.next());
    }

    #[test]
    fn append_error_names_the_event() {
        let error = EventLogError::AppendFailed {
            event_type: "RequestDenied.v1".to_string(),
            reason: "disk full".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Append failed for event 'RequestDenied.v1': disk full"
        );
    }
}
