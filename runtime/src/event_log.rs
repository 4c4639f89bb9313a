//! In-memory event log with live subscriptions.

use access_ledger_core::event::SerializedEvent;
use access_ledger_core::event_log::{EventLog, EventLogError, LoggedEvent, Position};
use std::future::{Future, ready};
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Default number of events a lagging subscriber can fall behind.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Process-local, append-only event log.
///
/// Every appended event is kept for the lifetime of the log and forwarded to
/// live subscribers. Subscribers that fall more than the broadcast capacity
/// behind observe `RecvError::Lagged` and can catch up with
/// [`EventLog::read_from`].
#[derive(Clone, Debug)]
pub struct InMemoryEventLog {
    entries: Arc<RwLock<Vec<LoggedEvent>>>,
    broadcast: broadcast::Sender<LoggedEvent>,
}

impl InMemoryEventLog {
    /// Create an empty log with [`DEFAULT_BROADCAST_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_broadcast_capacity(DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create an empty log whose subscribers buffer up to `capacity` events.
    #[must_use]
    pub fn with_broadcast_capacity(capacity: usize) -> Self {
        let (broadcast, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            broadcast,
        }
    }

    /// Receive every event appended after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LoggedEvent> {
        self.broadcast.subscribe()
    }

    /// Number of events stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    /// Whether nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type identifiers of every stored event, in append order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.entries.read().map_or_else(
            |_| Vec::new(),
            |entries| entries.iter().map(|e| e.event.event_type.clone()).collect(),
        )
    }

    fn append_now(&self, event: SerializedEvent) -> Result<Position, EventLogError> {
        let mut entries = self.entries.write().map_err(|_| EventLogError::AppendFailed {
            event_type: event.event_type.clone(),
            reason: "event log lock poisoned".to_string(),
        })?;

        let position = Position::new(entries.len() as u64);
        let logged = LoggedEvent { position, event };
        entries.push(logged.clone());
        drop(entries);

        // No receivers is not an error: the log itself is the record.
        let _ = self.broadcast.send(logged);
        Ok(position)
    }

    fn read_now(&self, position: Position) -> Result<Vec<LoggedEvent>, EventLogError> {
        let entries = self.entries.read().map_err(|_| EventLogError::ReadFailed {
            position,
            reason: "event log lock poisoned".to_string(),
        })?;

        let start = usize::try_from(position.offset()).unwrap_or(usize::MAX);
        Ok(entries.iter().skip(start).cloned().collect())
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(
        &self,
        event: SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<Position, EventLogError>> + Send + '_>> {
        Box::pin(ready(self.append_now(event)))
    }

    fn read_from(
        &self,
        position: Position,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LoggedEvent>, EventLogError>> + Send + '_>> {
        Box::pin(ready(self.read_now(position)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(event_type: &str) -> SerializedEvent {
        SerializedEvent::new(event_type.to_string(), vec![1, 2, 3], None)
    }

    #[tokio::test]
    async fn append_assigns_sequential_positions() {
        let log = InMemoryEventLog::new();

        let first = log.append(event("A.v1")).await.unwrap();
        let second = log.append(event("B.v1")).await.unwrap();

        assert_eq!(first, Position::START);
        assert_eq!(second, Position::new(1));
        assert_eq!(log.len(), 2);
        assert_eq!(log.event_types(), vec!["A.v1", "B.v1"]);
    }

    #[tokio::test]
    async fn read_from_skips_earlier_positions() {
        let log = InMemoryEventLog::new();
        for name in ["A.v1", "B.v1", "C.v1"] {
            log.append(event(name)).await.unwrap();
        }

        let tail = log.read_from(Position::new(1)).await.unwrap();

        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].position, Position::new(1));
        assert_eq!(tail[1].event.event_type, "C.v1");
        assert!(log.read_from(Position::new(10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_appends_in_order() {
        let log = InMemoryEventLog::with_broadcast_capacity(8);
        let mut rx = log.subscribe();

        log.append(event("A.v1")).await.unwrap();
        log.append(event("B.v1")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().event.event_type, "A.v1");
        assert_eq!(rx.recv().await.unwrap().event.event_type, "B.v1");
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let log = InMemoryEventLog::with_broadcast_capacity(0);
        assert!(log.is_empty());
        let _rx = log.subscribe();
    }
}
