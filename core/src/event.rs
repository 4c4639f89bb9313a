//! Event trait and related types.
//!
//! Events are immutable facts published after a state change is committed.
//! They are serialized with `bincode` before being appended to the event log;
//! the same bytes are decoded again when a store is rebuilt by replay.
//!
//! # Example
//!
//! ```
//! use access_ledger_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum GrantEvent {
//!     Granted { grant_id: u64 },
//!     Revoked { grant_id: u64 },
//! }
//!
//! impl Event for GrantEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             GrantEvent::Granted { .. } => "Granted.v1",
//!             GrantEvent::Revoked { .. } => "Revoked.v1",
//!         }
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// An event that can be appended to the event log and replayed later.
///
/// # Event Naming Convention
///
/// `event_type()` returns a stable identifier with a version suffix, for
/// example `"RequestApproved.v1"`, so consumers can route on it without
/// decoding the payload.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Optional JSON metadata stored next to the payload.
    ///
    /// Consumers use it to filter the log without decoding bincode bytes.
    fn metadata(&self) -> Option<serde_json::Value> {
        None
    }

    /// Serialize this event to bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        bincode::serialize(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are corrupted or
    /// were produced by an incompatible schema.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        bincode::deserialize(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready for the event log.
#[derive(Clone, Debug, PartialEq)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., "RequestCreated.v1").
    pub event_type: String,

    /// The bincode-serialized event data.
    pub data: Vec<u8>,

    /// Optional JSON metadata.
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Serialize an event, carrying over its type identifier and metadata.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    pub fn from_event<E: Event + Serialize>(event: &E) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata: event.metadata(),
        })
    }

    /// Decode the payload back into an event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the payload does not decode as `E`.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_bytes(&self.data)
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    enum TestEvent {
        Granted { grant_id: u64, holder: String },
        Revoked { grant_id: u64 },
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Granted { .. } => "TestEvent.Granted.v1",
                TestEvent::Revoked { .. } => "TestEvent.Revoked.v1",
            }
        }

        fn metadata(&self) -> Option<serde_json::Value> {
            match self {
                TestEvent::Granted { grant_id, .. } | TestEvent::Revoked { grant_id } => {
                    Some(serde_json::json!({ "grant_id": grant_id }))
                },
            }
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn serialized_event_carries_type_and_metadata() {
        let event = TestEvent::Revoked { grant_id: 7 };

        let serialized = SerializedEvent::from_event(&event).expect("serialization should succeed");

        assert_eq!(serialized.event_type, "TestEvent.Revoked.v1");
        assert!(!serialized.data.is_empty());
        assert_eq!(serialized.metadata, Some(serde_json::json!({ "grant_id": 7 })));
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn serialized_event_decodes_to_original() {
        let event = TestEvent::Granted {
            grant_id: 1,
            holder: "alice".to_string(),
        };

        let serialized = SerializedEvent::from_event(&event).expect("serialization should succeed");
        let decoded: TestEvent = serialized.decode().expect("decode should succeed");

        assert_eq!(decoded, event);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let serialized = SerializedEvent::new("TestEvent.Granted.v1".to_string(), vec![0xFF], None);

        let result: Result<TestEvent, _> = serialized.decode();

        assert!(matches!(result, Err(EventError::DeserializationError(_))));
    }

    #[test]
    fn serialized_event_display() {
        let serialized =
            SerializedEvent::new("TestEvent.v1".to_string(), vec![1, 2, 3, 4, 5], None);

        let display = format!("{serialized}");
        assert!(display.contains("TestEvent.v1"));
        assert!(display.contains("5 bytes"));
    }
}
